//! Assembly of the SOR simulation report.
//!
//! [`ReportComposer`] is a typestate builder: every section is added through a method that is only
//! available in the preceding stage and consumes the composer, so sections always appear in the
//! order header, statistics table, charts, conclusions, and nothing can be appended once the
//! report has been finalized.  All text passes through [`transliterate`] before it is stored.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::info;

use crate::builder;
use crate::charts::ChartArtifact;
use crate::error::{RenderError, ReportError};
use crate::model::{
    Block, HorizontalAlignment, ImageBlock, ImageSource, ReportDocument, Section, TableBlock,
};
use crate::stats::{round2, PriorityStatistics};
use crate::text::transliterate;

/// Title repeated in every page header.
pub const REPORT_TITLE: &str = "Raport Symulacji SOR";

pub const INTRODUCTION_HEADING: &str = "1. Wprowadzenie";
pub const STATISTICS_HEADING: &str = "2. Statystyki oczekiwania";
pub const CHARTS_HEADING: &str = "3. Wykresy";
pub const CONCLUSIONS_HEADING: &str = "4. Wnioski i rekomendacje";

pub const INTRODUCTION: &str = "Celem symulacji było zbadanie obciążenia Szpitalnego Oddziału \
Ratunkowego oraz analiza średniego czasu oczekiwania pacjentów w zależności od priorytetu. \
Wykresy oraz statystyki znajdują się poniżej.";

const RECOMMENDATION: &str = "- Dla większego obciążenia należy przetestować dynamiczną \
alokację personelu oraz szybką ścieżkę dla pacjentów o niskim priorytecie.";

const NO_DATA: &str = "- Zbiór danych nie zawierał żadnych pacjentów, więc nie można ocenić \
czasu oczekiwania.";

/// Table columns and their widths in millimetres.
pub const STATISTICS_COLUMNS: [(&str, f64); 6] = [
    ("Priorytet", 30.0),
    ("Liczba", 25.0),
    ("Średnia", 25.0),
    ("Max", 20.0),
    ("Min", 20.0),
    ("Std", 25.0),
];

/// Rendered width of both charts.
pub const CHART_WIDTH_MM: f64 = 170.0;

const SECTION_GAP_MM: f64 = 5.0;

/// Formats a rounded statistic with two decimals, `NaN` for undefined values.
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else {
        format!("{:.2}", value)
    }
}

/// Formats an extreme: integral values without decimals, others like [`format_decimal`].
pub fn format_extreme(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format_decimal(value)
    }
}

/// Cells of one statistics table row, in [`STATISTICS_COLUMNS`] order.
pub fn statistics_row(group: &PriorityStatistics) -> [String; 6] {
    [
        group.key.clone(),
        group.count.to_string(),
        format_decimal(group.mean),
        format_extreme(group.max),
        format_extreme(group.min),
        format_decimal(group.std),
    ]
}

fn statistics_table(stats: &[PriorityStatistics]) -> TableBlock {
    let columns = STATISTICS_COLUMNS
        .iter()
        .map(|(header, width)| (transliterate(header), *width));
    stats.iter().fold(TableBlock::new(columns), |table, group| {
        table.with_row(statistics_row(group).map(|cell| transliterate(&cell)))
    })
}

/// Derives the conclusions paragraph from the statistics.
pub fn conclusions(stats: &[PriorityStatistics]) -> String {
    let total: usize = stats.iter().map(|group| group.count).sum();
    if total == 0 {
        return format!("{}\n{}", NO_DATA, RECOMMENDATION);
    }

    let overall = round2(stats.iter().map(|group| group.sum).sum::<f64>() / total as f64);
    let longest = stats
        .iter()
        .filter(|group| !group.mean.is_nan())
        .max_by(|a, b| a.mean.total_cmp(&b.mean));

    let mut lines = vec![format!(
        "- Średni czas oczekiwania wszystkich {} pacjentów wyniósł {} min.",
        total,
        format_decimal(overall)
    )];
    if let Some(group) = longest {
        lines.push(format!(
            "- Najdłuższy średni czas oczekiwania mieli pacjenci z priorytetem {} ({} min).",
            group.key,
            format_decimal(group.mean)
        ));
    }
    lines.push(RECOMMENDATION.to_owned());
    lines.join("\n")
}

/// Stage of the composer, observable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportStage {
    Empty,
    HeaderAdded,
    TableAdded,
    ChartsAdded,
    ConclusionsAdded,
    Finalized,
}

mod sealed {
    pub trait Sealed {}
}

/// Marker types for the composer stages.
pub trait Stage: sealed::Sealed {
    const STAGE: ReportStage;
}

macro_rules! stages {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug)]
            pub struct $name;
            impl sealed::Sealed for $name {}
            impl Stage for $name {
                const STAGE: ReportStage = ReportStage::$name;
            }
        )*
    };
}

stages! {
    Empty,
    HeaderAdded,
    TableAdded,
    ChartsAdded,
    ConclusionsAdded,
}

/// Builds the report document one section at a time.
#[derive(Debug)]
pub struct ReportComposer<S: Stage> {
    document: ReportDocument,
    _stage: PhantomData<S>,
}

impl<S: Stage> ReportComposer<S> {
    fn advance<T: Stage>(mut self, section: Section) -> ReportComposer<T> {
        self.document.push_section(section);
        ReportComposer {
            document: self.document,
            _stage: PhantomData,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> ReportStage {
        S::STAGE
    }

    /// Document assembled so far.
    pub fn document(&self) -> &ReportDocument {
        &self.document
    }
}

impl Default for ReportComposer<Empty> {
    fn default() -> Self {
        Self::new(REPORT_TITLE)
    }
}

impl ReportComposer<Empty> {
    /// Starts an empty report whose pages carry `title` in their header.
    pub fn new(title: &str) -> Self {
        Self {
            document: ReportDocument::new(transliterate(title)),
            _stage: PhantomData,
        }
    }

    /// Adds the introduction section below the page header.
    pub fn add_header(self, heading: &str, introduction: &str) -> ReportComposer<HeaderAdded> {
        let section = Section::new(transliterate(heading))
            .with_block(Block::paragraph(transliterate(introduction)));
        self.advance(section)
    }
}

impl ReportComposer<HeaderAdded> {
    /// Adds the statistics section with one table row per group.
    pub fn add_statistics_table(
        self,
        heading: &str,
        stats: &[PriorityStatistics],
    ) -> ReportComposer<TableAdded> {
        let section = Section::new(transliterate(heading))
            .with_block(Block::Table(statistics_table(stats)))
            .with_block(Block::Spacer(SECTION_GAP_MM));
        self.advance(section)
    }
}

impl ReportComposer<TableAdded> {
    /// Adds the charts section; images are embedded in the order given.
    pub fn add_charts(
        self,
        heading: &str,
        charts: &[(&ChartArtifact, &str)],
    ) -> ReportComposer<ChartsAdded> {
        let images = charts.iter().map(|(artifact, caption)| {
            Block::Image(
                ImageBlock::new(ImageSource::from_path(artifact.path.clone()))
                    .with_caption(Some(transliterate(caption)))
                    .with_alignment(HorizontalAlignment::Center)
                    .with_width_mm(Some(CHART_WIDTH_MM)),
            )
        });
        let section = Section::new(transliterate(heading)).with_blocks(images);
        self.advance(section)
    }
}

impl ReportComposer<ChartsAdded> {
    /// Adds the closing conclusions section.
    pub fn add_conclusions(self, heading: &str, text: &str) -> ReportComposer<ConclusionsAdded> {
        let section =
            Section::new(transliterate(heading)).with_block(Block::paragraph(transliterate(text)));
        self.advance(section)
    }
}

impl ReportComposer<ConclusionsAdded> {
    /// Renders the document and writes it to `path` in a single write.
    pub fn finalize(self, path: impl AsRef<Path>) -> Result<FinalizedReport, ReportError> {
        let path = path.as_ref();
        let pdf = builder::render_document(&self.document)
            .map_err(RenderError::from)?;
        fs::write(path, &pdf.bytes).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Wrote report to {} ({} bytes)",
            path.display(),
            pdf.bytes.len()
        );

        Ok(FinalizedReport {
            path: path.to_path_buf(),
            bytes_written: pdf.bytes.len(),
            document: self.document,
        })
    }
}

/// A report that has been serialized; the document is kept read-only for inspection.
#[derive(Debug)]
pub struct FinalizedReport {
    path: PathBuf,
    bytes_written: usize,
    document: ReportDocument,
}

impl FinalizedReport {
    pub fn stage(&self) -> ReportStage {
        ReportStage::Finalized
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn document(&self) -> &ReportDocument {
        &self.document
    }
}

/// Assembles the standard four-section report up to, but not including, finalization.
pub fn compose_report(
    stats: &[PriorityStatistics],
    mean_chart: &ChartArtifact,
    distribution_chart: &ChartArtifact,
) -> ReportComposer<ConclusionsAdded> {
    ReportComposer::new(REPORT_TITLE)
        .add_header(INTRODUCTION_HEADING, INTRODUCTION)
        .add_statistics_table(STATISTICS_HEADING, stats)
        .add_charts(
            CHARTS_HEADING,
            &[
                (mean_chart, "Rysunek 1. Średni czas oczekiwania według priorytetu"),
                (distribution_chart, "Rysunek 2. Rozkład czasu oczekiwania według priorytetu"),
            ],
        )
        .add_conclusions(CONCLUSIONS_HEADING, &conclusions(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PatientRecord;
    use crate::stats::priority_statistics;

    fn scenario_stats() -> Vec<PriorityStatistics> {
        priority_statistics(&[
            PatientRecord::new("High", 5.0),
            PatientRecord::new("High", 7.0),
            PatientRecord::new("Medium", 10.0),
            PatientRecord::new("Low", 2.0),
        ])
    }

    fn artifact(name: &str) -> ChartArtifact {
        ChartArtifact {
            path: PathBuf::from(name),
            size: (10, 10),
        }
    }

    fn table_of(document: &ReportDocument) -> &TableBlock {
        document.sections()[1]
            .blocks()
            .iter()
            .find_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .expect("statistics table present")
    }

    #[test]
    fn stages_advance_in_order() {
        let composer = ReportComposer::<Empty>::default();
        assert_eq!(composer.stage(), ReportStage::Empty);
        let composer = composer.add_header("Intro", "Body");
        assert_eq!(composer.stage(), ReportStage::HeaderAdded);
        let composer = composer.add_statistics_table("Stats", &[]);
        assert_eq!(composer.stage(), ReportStage::TableAdded);
        let composer = composer.add_charts("Charts", &[]);
        assert_eq!(composer.stage(), ReportStage::ChartsAdded);
        let composer = composer.add_conclusions("End", "Done");
        assert_eq!(composer.stage(), ReportStage::ConclusionsAdded);
        assert_eq!(composer.document().sections().len(), 4);
    }

    #[test]
    fn headings_are_transliterated() {
        let composer = ReportComposer::new("Raport ł").add_header("Rozkład według", "Zażółć");
        let document = composer.document();
        assert_eq!(document.title(), "Raport l");
        assert_eq!(document.sections()[0].title(), "Rozklad wedlug");
        assert_eq!(
            document.sections()[0].blocks()[0],
            Block::paragraph("Zazolc")
        );
    }

    #[test]
    fn statistics_table_uses_fixed_columns() {
        let composer = compose_report(&scenario_stats(), &artifact("a.png"), &artifact("b.png"));
        let table = table_of(composer.document());

        let headers: Vec<_> = table.headers().collect();
        assert_eq!(
            headers,
            vec!["Priorytet", "Liczba", "Srednia", "Max", "Min", "Std"]
        );
        let widths: Vec<_> = table.widths_mm().collect();
        assert_eq!(widths, vec![30.0, 25.0, 25.0, 20.0, 20.0, 25.0]);

        assert_eq!(table.rows().len(), 3);
        assert_eq!(
            table.rows()[0],
            vec!["High", "2", "6.00", "7", "5", "1.41"]
        );
        assert_eq!(table.rows()[1], vec!["Low", "1", "2.00", "2", "2", "NaN"]);
        assert_eq!(
            table.rows()[2],
            vec!["Medium", "1", "10.00", "10", "10", "NaN"]
        );
    }

    #[test]
    fn charts_are_embedded_mean_first() {
        let composer = compose_report(
            &scenario_stats(),
            &artifact("mean.png"),
            &artifact("box.png"),
        );
        let charts = &composer.document().sections()[2];
        assert_eq!(charts.title(), "3. Wykresy");

        let sources: Vec<_> = charts
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Image(image) => Some(image.source().clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            sources,
            vec![
                ImageSource::from_path("mean.png"),
                ImageSource::from_path("box.png"),
            ]
        );
    }

    #[test]
    fn document_text_is_plain_ascii() {
        let composer = compose_report(&scenario_stats(), &artifact("a.png"), &artifact("b.png"));
        let document = composer.document();
        assert!(document.title().is_ascii());
        for section in document.sections() {
            assert!(section.title().is_ascii());
            for block in section.blocks() {
                match block {
                    Block::Paragraph(paragraph) => assert!(paragraph.text().is_ascii()),
                    Block::Image(image) => assert!(image.caption().map_or(true, str::is_ascii)),
                    Block::Table(table) => {
                        assert!(table.headers().all(str::is_ascii));
                        assert!(table.rows().iter().flatten().all(|cell| cell.is_ascii()));
                    }
                    Block::Spacer(_) => {}
                }
            }
        }
    }

    #[test]
    fn conclusions_name_the_longest_wait() {
        let text = conclusions(&scenario_stats());
        assert!(text.contains("4 pacjentów wyniósł 6.00 min"));
        assert!(text.contains("priorytetem Medium (10.00 min)"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn overall_mean_uses_unrounded_waits() {
        let stats = priority_statistics(&[
            PatientRecord::new("High", 0.0),
            PatientRecord::new("High", 0.0),
            PatientRecord::new("High", 2.0),
            PatientRecord::new("Low", 0.656),
        ]);
        let text = conclusions(&stats);
        assert!(text.contains("4 pacjentów wyniósł 0.66 min"), "{}", text);
    }

    #[test]
    fn conclusions_for_empty_dataset() {
        let text = conclusions(&[]);
        assert!(text.starts_with("- Zbiór danych nie zawierał"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn formatting_of_cells() {
        assert_eq!(format_decimal(6.0), "6.00");
        assert_eq!(format_decimal(f64::NAN), "NaN");
        assert_eq!(format_extreme(7.0), "7");
        assert_eq!(format_extreme(7.25), "7.25");
        assert_eq!(format_extreme(f64::NAN), "NaN");
        assert_eq!(format_extreme(1e20), "100000000000000000000.00");
    }
}
