//! Table formatting for catalog and plan listings
//!
//! Every listing is reduced to a header plus string rows, then rendered in the
//! requested [`OutputFormat`]. JSON is handled by callers, since it serializes
//! the typed values rather than the display strings.

use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::stage_cell;
use crate::cli::OutputFormat;
use crate::core::catalog::{format_decimal, CatalogRow, REQUIRED_COLUMNS};
use crate::core::plan::PlanEntry;

/// Header plus display rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Listing {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Render as text; `Json` falls back to the Auto table
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Tsv => {
                let mut out = String::new();
                for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
                    out.push_str(&row.join("\t"));
                    out.push('\n');
                }
                Ok(out)
            }
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(Vec::new());
                wtr.write_record(&self.headers).into_diagnostic()?;
                for row in &self.rows {
                    wtr.write_record(row).into_diagnostic()?;
                }
                let bytes = wtr.into_inner().into_diagnostic()?;
                String::from_utf8(bytes).into_diagnostic()
            }
            OutputFormat::Md => Ok(format!("{}\n", self.builder().build().with(Style::markdown()))),
            OutputFormat::Auto | OutputFormat::Json => {
                Ok(format!("{}\n", self.builder().build().with(Style::rounded())))
            }
        }
    }

    fn builder(&self) -> Builder {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder
    }
}

/// Catalog rows with the same columns as the source CSV
pub fn catalog_listing(rows: &[CatalogRow]) -> Listing {
    let mut listing = Listing::new(REQUIRED_COLUMNS);
    for row in rows {
        let mut cells = vec![
            row.implant_line.clone(),
            row.part_number.clone(),
            format_decimal(row.diameter),
            format_decimal(row.length),
            row.guide_sleeve.clone(),
            format_decimal(row.drill_length),
            format_decimal(row.offset),
        ];
        cells.extend(row.drill_sequence.iter().map(|(_, stage)| stage_cell(stage)));
        listing.push(cells);
    }
    listing
}

/// Plan review listing, one line per tooth
pub fn plan_listing(entries: &[&PlanEntry]) -> Listing {
    let mut listing = Listing::new([
        "Tooth",
        "Arch",
        "Implant Line",
        "Diameter",
        "Length",
        "Offset",
        "Approach",
        "Part No",
        "Guide Sleeve",
    ]);
    for entry in entries {
        listing.push(vec![
            entry.tooth.to_string(),
            entry.tooth.arch().to_string(),
            entry.implant_line.clone(),
            format!("{}mm", format_decimal(entry.diameter)),
            format!("{}mm", format_decimal(entry.length)),
            format!("{}mm", format_decimal(entry.offset)),
            entry.approach.to_string(),
            entry.row.part_number.clone(),
            entry.row.guide_sleeve.clone(),
        ]);
    }
    listing
}
