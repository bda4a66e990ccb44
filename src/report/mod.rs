//! Surgical drilling protocol reports
//!
//! A [`ProtocolReport`] is built from the finalized plan and rendered either
//! as Markdown (through an embedded tera template) or as JSON. Rendering never
//! touches the plan itself.

mod export;

use chrono::{DateTime, Local};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tera::Tera;
use thiserror::Error;

use crate::core::plan::PlanManager;

pub use export::{export_rows, ExportRow, ExportStage};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const PROTOCOL_TEMPLATE: &str = "protocol.md.tera";

/// Report title, also used as the default file name prefix
pub const REPORT_TITLE: &str = "PRIMUS DENTAL IMPLANT";

/// Case details typed in by the user; blanks become placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseInfo {
    pub doctor: Option<String>,
    pub patient: Option<String>,
    pub case_number: Option<String>,
}

fn filled(value: &Option<String>, placeholder: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

impl CaseInfo {
    pub fn doctor_or_placeholder(&self) -> String {
        filled(&self.doctor, "Dr. [Name]")
    }

    pub fn patient_or_placeholder(&self) -> String {
        filled(&self.patient, "[Patient Name]")
    }

    pub fn case_number_or_placeholder(&self) -> String {
        filled(&self.case_number, "[Case Number]")
    }
}

/// Output format for rendered reports
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown document
    #[default]
    Md,
    /// JSON document (for programs)
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Md => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Case block as printed at the top of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseDetails {
    pub doctor: String,
    pub patient: String,
    pub case_number: String,
    pub date: String,
    pub time: String,
}

/// Everything a renderer needs, fully formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolReport {
    pub title: String,
    pub case: CaseDetails,
    pub implants: Vec<ExportRow>,
    pub total_implants: usize,
    pub generated_at: String,
    pub software: String,
}

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ReportError {
    #[error("no implant plans to generate a report from")]
    #[diagnostic(code(implant_plan::report::empty_plan), help("add at least one implant first"))]
    EmptyPlan,

    #[error("report template error: {0}")]
    #[diagnostic(code(implant_plan::report::template))]
    Template(String),

    #[error("failed to serialize report: {0}")]
    #[diagnostic(code(implant_plan::report::serialize))]
    Serialize(#[from] serde_json::Error),
}

impl ProtocolReport {
    /// Build a report from the current plan; an empty plan is rejected
    pub fn new(
        case: &CaseInfo,
        plan: &PlanManager,
        generated: DateTime<Local>,
    ) -> Result<Self, ReportError> {
        let implants = export_rows(plan);
        if implants.is_empty() {
            return Err(ReportError::EmptyPlan);
        }

        Ok(Self {
            title: REPORT_TITLE.to_string(),
            case: CaseDetails {
                doctor: case.doctor_or_placeholder(),
                patient: case.patient_or_placeholder(),
                case_number: case.case_number_or_placeholder(),
                date: generated.format("%B %d, %Y").to_string(),
                time: generated.format("%I:%M %p").to_string(),
            },
            total_implants: implants.len(),
            implants,
            generated_at: generated.format("%B %d, %Y at %I:%M %p").to_string(),
            software: format!("implant-plan v{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Md => ReportRenderer::new()?.markdown(self),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
        }
    }
}

/// Renders reports with the embedded tera templates
pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    pub fn new() -> Result<Self, ReportError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                let template = std::str::from_utf8(&content.data)
                    .map_err(|e| ReportError::Template(format!("{}: {}", filename, e)))?;
                tera.add_raw_template(filename, template)
                    .map_err(|e| ReportError::Template(e.to_string()))?;
            }
        }

        Ok(Self { tera })
    }

    pub fn markdown(&self, report: &ProtocolReport) -> Result<String, ReportError> {
        let context = tera::Context::from_serialize(report)
            .map_err(|e| ReportError::Template(e.to_string()))?;
        self.tera
            .render(PROTOCOL_TEMPLATE, &context)
            .map_err(|e| ReportError::Template(e.to_string()))
    }
}

/// File name suggested for a report, e.g. `Primus_Report_C-42_20250101_093000.md`
pub fn default_file_name(case: &CaseInfo, generated: DateTime<Local>, format: ReportFormat) -> String {
    let case_number: String = filled(&case.case_number, "case")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "Primus_Report_{}_{}.{}",
        case_number,
        generated.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Catalog, CatalogRow, DrillSequence, DrillStage};
    use crate::core::plan::{ImplantSelection, SurgicalApproach};
    use crate::core::tooth::ToothNumber;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn generated() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap()
    }

    fn plan_with(teeth: &str) -> PlanManager {
        let mut stages = [DrillStage::Depth(dec("8.5")); 7];
        stages[0] = DrillStage::Depth(dec("4"));
        let mut pm = PlanManager::new(Catalog::from_rows(vec![CatalogRow {
            implant_line: "Primus".to_string(),
            part_number: "PBF3508S".to_string(),
            diameter: dec("3.5"),
            length: dec("8.5"),
            offset: dec("10"),
            guide_sleeve: "CGSC-5304".to_string(),
            drill_length: dec("18.5"),
            drill_sequence: DrillSequence::from_stages(stages),
        }]));
        if !teeth.is_empty() {
            pm.add_entries(
                &ToothNumber::parse_selection(teeth).unwrap(),
                &ImplantSelection::new("3.5", "8.5", "10").with_approach(SurgicalApproach::Flap),
            )
            .unwrap();
        }
        pm
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let err = ProtocolReport::new(&CaseInfo::default(), &plan_with(""), generated()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyPlan));
    }

    #[test]
    fn test_placeholders() {
        let report = ProtocolReport::new(&CaseInfo::default(), &plan_with("8"), generated()).unwrap();
        assert_eq!(report.case.doctor, "Dr. [Name]");
        assert_eq!(report.case.patient, "[Patient Name]");
        assert_eq!(report.case.case_number, "[Case Number]");
        assert_eq!(report.case.date, "March 14, 2025");
        assert_eq!(report.case.time, "09:05 AM");
    }

    #[test]
    fn test_markdown_contents() {
        let case = CaseInfo {
            doctor: Some("Dr. Molar".to_string()),
            patient: Some("Jane Roe".to_string()),
            case_number: Some("C-42".to_string()),
        };
        let report = ProtocolReport::new(&case, &plan_with("9,3"), generated()).unwrap();
        let md = report.render(ReportFormat::Md).unwrap();

        assert!(md.starts_with("# PRIMUS DENTAL IMPLANT\n## SURGICAL DRILLING PROTOCOL"));
        assert!(md.contains("| **Doctor:** | Dr. Molar |"));
        assert!(md.contains("| **Case Number:** | C-42 |"));
        assert!(md.contains("### IMPLANT #1 - TOOTH 3"));
        assert!(md.contains("### IMPLANT #2 - TOOTH 9"));
        assert!(md.find("TOOTH 3").unwrap() < md.find("TOOTH 9").unwrap());
        assert!(md.contains("| Part Number | PBF3508S |"));
        assert!(md.contains("| Surgical Approach | flap |"));
        assert!(md.contains("| 1 | Starter Drill | 4 mm | Initial pilot hole |\n| 2 | Initial Drill 1 | 8.5 mm |"));
        assert!(md.contains("| 7 | Drill 4 | 8.5 mm | Final preparation |"));
        assert!(md.contains("Ensure proper angulation with guide sleeve CGSC-5304"));
        assert!(md.contains("account for 10 mm offset"));
        assert!(md.contains("**Total Implants:** 2"));
        assert!(md.contains("March 14, 2025 at 09:05 AM"));
    }

    #[test]
    fn test_json_render() {
        let report = ProtocolReport::new(&CaseInfo::default(), &plan_with("14"), generated()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["total_implants"], 1);
        assert_eq!(json["implants"][0]["tooth"], 14);
        assert_eq!(json["implants"][0]["drill_sequence"][0]["depth"], "4 mm");
    }

    #[test]
    fn test_default_file_name() {
        let case = CaseInfo {
            case_number: Some("C 42/b".to_string()),
            ..CaseInfo::default()
        };
        assert_eq!(
            default_file_name(&case, generated(), ReportFormat::Md),
            "Primus_Report_C_42_b_20250314_090500.md"
        );
        assert_eq!(
            default_file_name(&CaseInfo::default(), generated(), ReportFormat::Json),
            "Primus_Report_case_20250314_090500.json"
        );
    }
}
