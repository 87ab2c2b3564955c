//! Custom `genpdf` elements used by the report layout.
//!
//! `genpdf` ships plain images without captions and only measures spacing in lines, so this module
//! adds a captioned image element, a fixed vertical gap, and the millimetre conversions the
//! builder needs.

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const DEFAULT_CAPTION_SPACING_MM: f64 = 2.0;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode chart image {}", path.display()))
}

/// An image with a caption stacked underneath, both sharing one alignment.
///
/// The image can be rescaled to a requested width while keeping its aspect ratio.  Once the image
/// has been placed on a page it is not drawn again, so a caption that spills onto the next page
/// does not duplicate the picture.
pub struct CaptionedImage {
    image: Image,
    caption: Option<Paragraph>,
    alignment: Alignment,
    natural_size: Size,
    requested_width: Option<Mm>,
    spacing: Mm,
    image_rendered: bool,
}

impl CaptionedImage {
    /// Wraps an already decoded image.
    pub fn from_dynamic_image(image: image::DynamicImage) -> Result<Self, Error> {
        let natural_size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
        let image = Image::from_dynamic_image(image)?;
        let mut element = Self {
            image,
            caption: None,
            alignment: Alignment::Left,
            natural_size,
            requested_width: None,
            spacing: mm_from_f64(DEFAULT_CAPTION_SPACING_MM),
            image_rendered: false,
        };
        element.apply_alignment();
        Ok(element)
    }

    /// Creates a captioned image from the contents of `bytes`.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_bytes(bytes)?)
    }

    /// Creates a captioned image from the file located at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_path(path)?)
    }

    /// Sets the caption and returns the updated element.
    pub fn with_caption(mut self, caption: impl Into<Option<Paragraph>>) -> Self {
        self.caption = caption.into();
        self.apply_alignment();
        self
    }

    /// Sets the horizontal alignment used by both the image and the caption.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self.apply_alignment();
        self
    }

    /// Constrains the rendered width and returns the updated element.
    pub fn with_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.requested_width = width.into();
        self.apply_width();
        self
    }

    fn apply_alignment(&mut self) {
        self.image.set_alignment(self.alignment);
        if let Some(caption) = self.caption.as_mut() {
            caption.set_alignment(self.alignment);
        }
    }

    fn apply_width(&mut self) {
        let scale = self
            .requested_width
            .map(mm_to_f64)
            .zip(Some(mm_to_f64(self.natural_size.width)))
            .filter(|(_, natural)| *natural > f64::EPSILON)
            .map_or(1.0, |(desired, natural)| desired / natural);
        self.image.set_scale(Scale::new(scale, scale));
    }
}

impl Element for CaptionedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();

        if !self.image_rendered {
            let image_result = self.image.render(context, area.clone(), style)?;
            if image_result.has_more {
                return Ok(image_result);
            }
            self.image_rendered = true;
            result.size = result.size.stack_vertical(image_result.size);
            area.add_offset(Position::new(0, image_result.size.height + self.spacing));
            result.size = result.size.stack_vertical(Size::new(0, self.spacing));
        }

        if let Some(caption) = self.caption.as_mut() {
            let caption_result = caption.render(context, area, style)?;
            result.size = result.size.stack_vertical(caption_result.size);
            result.has_more |= caption_result.has_more;
        }

        Ok(result)
    }
}

/// Fixed vertical gap, clipped to the space left on the page.
pub struct VerticalSpace {
    height: Mm,
}

impl VerticalSpace {
    /// Creates a gap of `height_mm` millimetres.
    pub fn new(height_mm: f64) -> Self {
        Self {
            height: mm_from_f64(height_mm),
        }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };

        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}
