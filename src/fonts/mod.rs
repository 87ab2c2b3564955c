//! Font discovery for the PDF document and the chart renderer.
//!
//! The bundled Roboto family is looked up first (see `assets/fonts/README.md`).  When it is
//! missing, a few widely installed system families are tried instead.  Both the document and the
//! charts use whichever family is found, so text metrics stay consistent across artifacts.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use log::{info, warn};
use plotters::style::FontStyle;

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Family name under which chart fonts are registered with `plotters`.
pub const CHART_FONT_FAMILY: &str = "sans-serif";

/// Overrides the bundled font directory.
pub const FONTS_DIR_ENV: &str = "SOR_REPORT_FONTS_DIR";

/// Overrides the list of system directories searched for fallback families.
pub const FALLBACK_FONTS_DIR_ENV: &str = "SOR_REPORT_FALLBACK_FONTS_DIR";

/// File names making up one font family.
struct FamilyFiles {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const BUNDLED_FAMILY: FamilyFiles = FamilyFiles {
    name: DEFAULT_FONT_FAMILY_NAME,
    regular: "Roboto-Regular.ttf",
    bold: "Roboto-Bold.ttf",
    italic: "Roboto-Italic.ttf",
    bold_italic: "Roboto-BoldItalic.ttf",
};

const FALLBACK_FAMILIES: &[FamilyFiles] = &[
    FamilyFiles {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
    FamilyFiles {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    FamilyFiles {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
];

/// Resolved on-disk locations of a complete font family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFiles {
    family: &'static str,
    regular: PathBuf,
    bold: PathBuf,
    italic: PathBuf,
    bold_italic: PathBuf,
}

impl FontFiles {
    fn in_directory(directory: &Path, family: &FamilyFiles) -> Self {
        Self {
            family: family.name,
            regular: directory.join(family.regular),
            bold: directory.join(family.bold),
            italic: directory.join(family.italic),
            bold_italic: directory.join(family.bold_italic),
        }
    }

    fn paths(&self) -> [&Path; 4] {
        [&self.regular, &self.bold, &self.italic, &self.bold_italic]
    }

    fn missing(&self) -> Vec<&Path> {
        self.paths()
            .into_iter()
            .filter(|path| !path.is_file())
            .collect()
    }

    /// Human readable family name.
    pub fn family(&self) -> &str {
        self.family
    }

    /// Path of the regular face.
    pub fn regular(&self) -> &Path {
        &self.regular
    }

    /// Path of the bold face.
    pub fn bold(&self) -> &Path {
        &self.bold
    }

    fn load(&self) -> Result<FontFamily<FontData>, Error> {
        let load = |path: &Path, style: &str| {
            FontData::load(path, None).map_err(|err| {
                Error::new(
                    format!(
                        "Failed to load {} {} font at {}: {}",
                        self.family,
                        style,
                        path.display(),
                        err
                    ),
                    io::Error::new(io::ErrorKind::Other, err.to_string()),
                )
            })
        };

        Ok(FontFamily {
            regular: load(&self.regular, "regular")?,
            bold: load(&self.bold, "bold")?,
            italic: load(&self.italic, "italic")?,
            bold_italic: load(&self.bold_italic, "bold italic")?,
        })
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn fallback_directory_candidates() -> Vec<PathBuf> {
    if let Some(path) = env_path(FALLBACK_FONTS_DIR_ENV) {
        return vec![path];
    }

    let mut candidates = Vec::new();

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                candidates.push(root.join("Fonts"));
            }
        }
    }

    #[cfg(not(windows))]
    {
        for dir in [
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu-sans-fonts",
            "/usr/share/fonts/TTF",
            "/Library/Fonts",
        ] {
            candidates.push(PathBuf::from(dir));
        }
    }

    candidates
}

/// Directory inside the crate where the bundled fonts are expected.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// Locates a complete font family, preferring the bundled Roboto files.
pub fn resolve_font_files() -> Result<FontFiles, Error> {
    let mut attempts = Vec::new();

    for directory in bundled_directory_candidates() {
        let files = FontFiles::in_directory(&directory, &BUNDLED_FAMILY);
        let missing = files.missing();
        if missing.is_empty() {
            return Ok(files);
        }
        attempts.push(format!(
            "{} (missing {})",
            directory.display(),
            missing.len()
        ));
    }

    for directory in fallback_directory_candidates() {
        for family in FALLBACK_FAMILIES {
            let files = FontFiles::in_directory(&directory, family);
            if files.missing().is_empty() {
                warn!(
                    "Bundled fonts unavailable; falling back to '{}' from {}",
                    family.name,
                    directory.display()
                );
                return Ok(files);
            }
        }
        attempts.push(format!("{} (no fallback family)", directory.display()));
    }

    Err(Error::new(
        format!(
            "No usable font family found. Checked: {}. See assets/fonts/README.md or set {}.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "no font family found"),
    ))
}

/// Loads the font family used for the PDF document.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let files = resolve_font_files()?;
    info!("Using font family '{}'", files.family());
    files.load()
}

/// Indicates whether any supported font family is present on disk.
pub fn default_fonts_available() -> bool {
    resolve_font_files().is_ok()
}

fn read_static(path: &Path) -> Result<&'static [u8], Error> {
    let bytes = fs::read(path).map_err(|err| {
        Error::new(format!("Failed to read font file {}", path.display()), err)
    })?;
    Ok(Box::leak(bytes.into_boxed_slice()))
}

fn register_faces(files: &FontFiles) -> Result<(), Error> {
    for (path, style) in [
        (files.regular(), FontStyle::Normal),
        (files.bold(), FontStyle::Bold),
    ] {
        let bytes = read_static(path)?;
        plotters::style::register_font(CHART_FONT_FAMILY, style, bytes).map_err(|_| {
            Error::new(
                format!("Font file {} could not be parsed", path.display()),
                ErrorKind::InvalidFont,
            )
        })?;
    }
    Ok(())
}

/// Registers the resolved family with `plotters` under [`CHART_FONT_FAMILY`].
///
/// Registration happens once per process; later calls return the outcome of the first attempt.
pub fn register_chart_fonts() -> Result<(), Error> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| {
            resolve_font_files()
                .and_then(|files| register_faces(&files))
                .map_err(|err| err.to_string())
        })
        .clone()
        .map_err(|message| {
            Error::new(
                message,
                io::Error::new(io::ErrorKind::NotFound, "chart fonts unavailable"),
            )
        })
}
