//! Data structures describing the logical content of the report document.
//!
//! The types in this module mirror the building blocks expected by `genpdf` without referencing
//! the rendering crate directly, so a document can be assembled and inspected in tests without
//! loading fonts.  [`crate::builder`] converts a [`ReportDocument`] into `genpdf` elements.

use std::path::PathBuf;

/// Alignment of textual and visual elements once they are converted into
/// [`genpdf::elements`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

/// Plain text paragraph.  Line breaks in the text start new lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextParagraph {
    text: String,
}

impl TextParagraph {
    /// Creates a left aligned paragraph.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the paragraph text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Bordered table with fixed column widths in millimetres.
#[derive(Clone, Debug, PartialEq)]
pub struct TableBlock {
    columns: Vec<(String, f64)>,
    rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Creates a table from `(header, width_mm)` pairs.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(header, width)| (header.into(), width))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Returns the column headers.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(header, _)| header.as_str())
    }

    /// Returns the column widths in millimetres.
    pub fn widths_mm(&self) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(|(_, width)| *width)
    }

    /// Sum of all column widths in millimetres.
    pub fn total_width_mm(&self) -> f64 {
        self.widths_mm().sum()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the body rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Appends a row; missing cells are left blank and surplus cells are dropped.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
        self
    }
}

/// Representation of image sources supported by the content model.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Image loaded from raw bytes.
    Bytes(Vec<u8>),
    /// Image referenced by a file path.
    Path(PathBuf),
}

impl ImageSource {
    /// Creates a new in-memory image from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Creates an image sourced from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }
}

/// Image with an optional caption rendered underneath.
///
/// The width is stored as millimetres to map straight onto the scaling applied by
/// [`crate::elements::CaptionedImage`].
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    source: ImageSource,
    caption: Option<String>,
    alignment: HorizontalAlignment,
    width_mm: Option<f64>,
}

impl ImageBlock {
    /// Creates a new image block using the provided source.
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            caption: None,
            alignment: HorizontalAlignment::Left,
            width_mm: None,
        }
    }

    /// Returns the image source.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Returns the caption, if any.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Returns the requested rendered width in millimetres, if any.
    pub fn width_mm(&self) -> Option<f64> {
        self.width_mm
    }

    /// Sets the caption and returns the updated image block.
    pub fn with_caption(mut self, caption: impl Into<Option<String>>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Sets the alignment and returns the updated image block.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Constrains the rendered width (in millimetres) and returns the updated block.
    pub fn with_width_mm(mut self, width_mm: impl Into<Option<f64>>) -> Self {
        self.width_mm = width_mm.into();
        self
    }
}

/// Individual content blocks that make up a section.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Body text.
    Paragraph(TextParagraph),
    /// Bordered table.
    Table(TableBlock),
    /// Captioned image.
    Image(ImageBlock),
    /// Vertical gap in millimetres.
    Spacer(f64),
}

impl Block {
    /// Convenience helper for building a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(TextParagraph::new(text))
    }

    /// Convenience helper for building an image block.
    pub fn image(source: ImageSource) -> Self {
        Self::Image(ImageBlock::new(source))
    }
}

/// A titled section of the report.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    /// Creates a new section with the provided heading.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Returns the section heading.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the blocks contained in the section.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the section with additional blocks and returns the updated instance.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }
}

/// Complete document: a title repeated in every page header and the ordered sections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportDocument {
    title: String,
    sections: Vec<Section>,
}

impl ReportDocument {
    /// Creates an empty document with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    /// Returns the document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the sections in rendering order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Appends a section.
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Appends a section and returns the updated document.
    pub fn with_section(mut self, section: Section) -> Self {
        self.push_section(section);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, ReportDocument, Section, TableBlock};

    #[test]
    fn table_rows_are_padded_to_column_count() {
        let table = TableBlock::new([("A", 10.0), ("B", 15.0), ("C", 5.0)])
            .with_row(["1"])
            .with_row(["1", "2", "3", "4"]);

        assert_eq!(table.column_count(), 3);
        assert_eq!(table.total_width_mm(), 30.0);
        assert_eq!(table.rows()[0], vec!["1", "", ""]);
        assert_eq!(table.rows()[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn sections_keep_insertion_order() {
        let document = ReportDocument::new("Report")
            .with_section(Section::new("One").with_block(Block::paragraph("a")))
            .with_section(Section::new("Two"));

        let titles: Vec<_> = document.sections().iter().map(Section::title).collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert_eq!(document.sections()[0].blocks().len(), 1);
    }
}
