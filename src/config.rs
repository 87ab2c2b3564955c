//! Paths and parsing options consumed by the report pipeline.

use std::path::{Path, PathBuf};

/// Default dataset location, as written by the simulation.
pub const DEFAULT_INPUT_PATH: &str = "statystyki.csv";
/// Default location of the wait time distribution chart.
pub const DEFAULT_BOXPLOT_PATH: &str = "boxplot_wait_times.png";
/// Default location of the mean wait time chart.
pub const DEFAULT_BAR_CHART_PATH: &str = "avg_wait_times.png";
/// Default location of the rendered PDF report.
pub const DEFAULT_REPORT_PATH: &str = "raport_sor_symulacja.pdf";

/// File locations and input options for a single report run.
///
/// Every field has a documented default so that a bare [`ReportConfig::default`]
/// reproduces the fixed file names used by the simulation tooling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    input_path: PathBuf,
    boxplot_path: PathBuf,
    bar_chart_path: PathBuf,
    report_path: PathBuf,
    delimiter: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            boxplot_path: PathBuf::from(DEFAULT_BOXPLOT_PATH),
            bar_chart_path: PathBuf::from(DEFAULT_BAR_CHART_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            delimiter: b',',
        }
    }
}

impl ReportConfig {
    /// Creates a configuration using the default paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places all three output artifacts inside `directory`, keeping their default names.
    pub fn with_output_dir(self, directory: impl AsRef<Path>) -> Self {
        let directory = directory.as_ref();
        self.with_boxplot_path(directory.join(DEFAULT_BOXPLOT_PATH))
            .with_bar_chart_path(directory.join(DEFAULT_BAR_CHART_PATH))
            .with_report_path(directory.join(DEFAULT_REPORT_PATH))
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn boxplot_path(&self) -> &Path {
        &self.boxplot_path
    }

    pub fn bar_chart_path(&self) -> &Path {
        &self.bar_chart_path
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Field delimiter of the input file.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Sets the dataset path and returns the updated configuration.
    pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Sets the distribution chart path and returns the updated configuration.
    pub fn with_boxplot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.boxplot_path = path.into();
        self
    }

    /// Sets the mean wait chart path and returns the updated configuration.
    pub fn with_bar_chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bar_chart_path = path.into();
        self
    }

    /// Sets the PDF output path and returns the updated configuration.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    /// Sets the field delimiter and returns the updated configuration.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_file_names() {
        let config = ReportConfig::default();
        assert_eq!(config.input_path(), Path::new("statystyki.csv"));
        assert_eq!(config.boxplot_path(), Path::new("boxplot_wait_times.png"));
        assert_eq!(config.bar_chart_path(), Path::new("avg_wait_times.png"));
        assert_eq!(config.report_path(), Path::new("raport_sor_symulacja.pdf"));
        assert_eq!(config.delimiter(), b',');
    }

    #[test]
    fn output_dir_keeps_default_names() {
        let config = ReportConfig::new().with_output_dir("out");
        assert_eq!(
            config.report_path(),
            Path::new("out/raport_sor_symulacja.pdf")
        );
        assert_eq!(
            config.boxplot_path(),
            Path::new("out/boxplot_wait_times.png")
        );
        assert_eq!(config.input_path(), Path::new("statystyki.csv"));
    }
}
