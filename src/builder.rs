//! Conversion of a [`ReportDocument`] into a rendered PDF.
//!
//! [`DocumentBuilder`] prepares a `genpdf::Document` with the page margins and a per-page header,
//! and [`render_document`] walks the content model, turning each block into `genpdf` elements.

use log::debug;

use genpdf::elements::{FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::error::Error;
use genpdf::style::{self, Style, StyledString};
use genpdf::{self, Alignment, Element, Margins, PageDecorator, Position};

use crate::elements::{mm_from_f64, CaptionedImage, VerticalSpace};
use crate::fonts;
use crate::model::{Block, HorizontalAlignment, ImageBlock, ImageSource, ReportDocument, TableBlock};

/// Width of an A4 page in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// Margin applied on every side of the page.
pub const PAGE_MARGIN_MM: f64 = 10.0;

pub const HEADER_FONT_SIZE: u8 = 14;
pub const HEADING_FONT_SIZE: u8 = 12;
pub const BODY_FONT_SIZE: u8 = 11;
pub const TABLE_FONT_SIZE: u8 = 10;
pub const CAPTION_FONT_SIZE: u8 = 9;

const HEADER_GAP_MM: f64 = 5.0;
const HEADING_GAP_MM: f64 = 3.0;
const PARAGRAPH_GAP_MM: f64 = 4.0;

type HeaderFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances pre-configured with the crate defaults.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    margins: Option<Margins>,
    header: Option<Box<HeaderFactory>>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document metadata title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a header callback that is invoked for every page.
    pub fn with_header<F, E>(mut self, header: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.header = Some(Box::new(move |page| {
            Box::new(header(page)) as Box<dyn Element>
        }));
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        document.set_font_size(BODY_FONT_SIZE);
        document.set_page_decorator(ConfiguredPageDecorator::new(self.margins, self.header));

        Ok(document)
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Option<Margins>,
    header: Option<Box<HeaderFactory>>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Option<Margins>, header: Option<Box<HeaderFactory>>) -> Self {
        Self {
            page: 0,
            margins,
            header,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(header_cb) = &self.header {
            let mut element = header_cb(self.page);
            let result = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height));
        }

        Ok(area)
    }
}

/// Bytes of a rendered PDF document.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
}

fn alignment(value: HorizontalAlignment) -> Alignment {
    match value {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

fn aligned_paragraph(text: &str, align: Alignment) -> Paragraph {
    let mut paragraph = Paragraph::new(text);
    paragraph.set_alignment(align);
    paragraph
}

fn page_header(title: &str) -> impl Element {
    let mut layout = LinearLayout::vertical();
    layout.push(
        aligned_paragraph(title, Alignment::Center)
            .styled(Style::new().bold().with_font_size(HEADER_FONT_SIZE)),
    );
    layout.push(VerticalSpace::new(HEADER_GAP_MM));
    layout
}

fn heading(title: &str) -> impl Element {
    let mut layout = LinearLayout::vertical();
    let style = Style::new().bold().with_font_size(HEADING_FONT_SIZE);
    layout.push(Paragraph::new(title).styled(style));
    layout.push(VerticalSpace::new(HEADING_GAP_MM));
    layout
}

/// Splits on line breaks, which `genpdf` paragraphs do not honour on their own.
fn body_text(text: &str) -> impl Element {
    let mut layout = LinearLayout::vertical();
    for line in text.lines() {
        layout.push(Paragraph::new(line));
    }
    layout.push(VerticalSpace::new(PARAGRAPH_GAP_MM));
    layout.styled(Style::new().with_font_size(BODY_FONT_SIZE))
}

fn table_cell(text: &str, style: Style) -> impl Element {
    Paragraph::new(text)
        .styled(style)
        .padded(Margins::trbl(2, 1, 2, 1))
}

/// Lays out the table with its fixed column widths.  `genpdf` distributes the available width by
/// weight, so the area is narrowed on the right to the sum of the column widths.
fn table(block: &TableBlock, available_width_mm: f64) -> Result<impl Element, Error> {
    let weights = block
        .widths_mm()
        .map(|width| (width * 10.0).round().max(1.0) as usize)
        .collect();
    let mut layout = TableLayout::new(weights);
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let header_style = Style::new().bold().with_font_size(TABLE_FONT_SIZE);
    let mut header = layout.row();
    for title in block.headers() {
        header.push_element(table_cell(title, header_style));
    }
    header.push()?;

    let body_style = Style::new().with_font_size(TABLE_FONT_SIZE);
    for cells in block.rows() {
        let mut row = layout.row();
        for cell in cells {
            row.push_element(table_cell(cell, body_style));
        }
        row.push()?;
    }

    let slack = (available_width_mm - block.total_width_mm()).max(0.0);
    let padding = Margins::trbl(0, mm_from_f64(slack), mm_from_f64(PARAGRAPH_GAP_MM), 0);
    Ok(layout.padded(padding))
}

fn image(block: &ImageBlock) -> Result<impl Element, Error> {
    let element = match block.source() {
        ImageSource::Path(path) => CaptionedImage::from_path(path)?,
        ImageSource::Bytes(bytes) => CaptionedImage::from_bytes(bytes)?,
    };
    let align = alignment(block.alignment());
    let caption = block.caption().map(|text| {
        let style = Style::new().italic().with_font_size(CAPTION_FONT_SIZE);
        let mut paragraph = Paragraph::new(StyledString::new(text.to_owned(), style));
        paragraph.set_alignment(align);
        paragraph
    });

    let element = element
        .with_alignment(align)
        .with_width(block.width_mm().map(mm_from_f64))
        .with_caption(caption);

    let mut layout = LinearLayout::vertical();
    layout.push(element);
    layout.push(VerticalSpace::new(PARAGRAPH_GAP_MM));
    Ok(layout)
}

fn push_block(
    document: &mut genpdf::Document,
    block: &Block,
    available_width_mm: f64,
) -> Result<(), Error> {
    match block {
        Block::Paragraph(paragraph) => document.push(body_text(paragraph.text())),
        Block::Table(block) => document.push(table(block, available_width_mm)?),
        Block::Image(block) => document.push(image(block)?),
        Block::Spacer(height_mm) => document.push(VerticalSpace::new(*height_mm)),
    }
    Ok(())
}

/// Renders the document to PDF bytes using the default fonts and A4 layout.
pub fn render_document(report: &ReportDocument) -> Result<RenderedPdf, Error> {
    let title = report.title().to_owned();
    let mut document = DocumentBuilder::new()
        .with_title(report.title())
        .with_margins(Margins::all(mm_from_f64(PAGE_MARGIN_MM)))
        .with_header(move |_| page_header(&title))
        .build()?;

    let available_width_mm = A4_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
    for section in report.sections() {
        debug!("Laying out section '{}'", section.title());
        document.push(heading(section.title()));
        for block in section.blocks() {
            push_block(&mut document, block, available_width_mm)?;
        }
    }

    let mut bytes = Vec::new();
    document.render(&mut bytes)?;
    Ok(RenderedPdf { bytes })
}
