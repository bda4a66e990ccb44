//! `implant-plan plan` command - Build a plan in one go and render the protocol
//!
//! Selections come from the command line, from a YAML request file, or both
//! (file first). Each selection is applied in order against one session, so a
//! later selection for the same tooth replaces an earlier one.
//!
//! ```yaml
//! case:
//!   doctor: Dr. Molar
//!   patient: Jane Roe
//!   case_number: C-42
//! implants:
//!   - teeth: "3-5"
//!     diameter: 3.5
//!     length: 8.5
//!     offset: 10
//!   - teeth: [14]
//!     diameter: "4.0"
//!     length: 10
//!     offset: 10
//!     approach: flap
//! ```

use chrono::Local;
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{summarize_add, write_output};
use crate::cli::{GlobalOpts, OutputFormat, Session};
use crate::core::plan::{ImplantSelection, SurgicalApproach};
use crate::core::tooth::{ToothError, ToothNumber};
use crate::core::Config;
use crate::report::{default_file_name, CaseInfo, ReportFormat};

#[derive(clap::Args, Debug, Default)]
pub struct PlanArgs {
    /// Teeth to plan, e.g. "8", "3,4,5" or "3-5"
    #[arg(long, short = 't')]
    pub teeth: Option<String>,

    /// Implant diameter in mm
    #[arg(long, short = 'd')]
    pub diameter: Option<String>,

    /// Implant length in mm
    #[arg(long, short = 'l')]
    pub length: Option<String>,

    /// Offset in mm
    #[arg(long, short = 'o')]
    pub offset: Option<String>,

    /// Surgical approach (default: config, then flapless)
    #[arg(long, short = 'a')]
    pub approach: Option<SurgicalApproach>,

    /// Implant line recorded on the entries (default: the catalog row's line)
    #[arg(long)]
    pub line: Option<String>,

    /// YAML request file with case details and a list of selections
    #[arg(long, short = 'r')]
    pub request: Option<PathBuf>,

    /// Report rejected selections and carry on with the rest
    #[arg(long)]
    pub skip_errors: bool,

    /// Doctor name on the report
    #[arg(long)]
    pub doctor: Option<String>,

    /// Patient name on the report
    #[arg(long)]
    pub patient: Option<String>,

    /// Case number on the report
    #[arg(long = "case")]
    pub case_number: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the report into the configured report directory under a generated name
    #[arg(long, conflicts_with = "output")]
    pub save: bool,
}

/// Batch request file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanRequest {
    pub case: CaseInfo,
    pub implants: Vec<ImplantRequest>,
}

/// One selection in a request file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplantRequest {
    pub teeth: TeethSpec,
    #[serde(default)]
    pub implant_line: Option<String>,
    #[serde(default)]
    pub diameter: Option<Scalar>,
    #[serde(default)]
    pub length: Option<Scalar>,
    #[serde(default)]
    pub offset: Option<Scalar>,
    #[serde(default)]
    pub approach: Option<SurgicalApproach>,
}

/// Teeth as a number, a list of numbers, or selection text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TeethSpec {
    One(u32),
    List(Vec<u32>),
    Text(String),
}

/// A YAML number or string, kept as text until validation
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

impl TeethSpec {
    pub fn resolve(&self) -> Result<BTreeSet<ToothNumber>, ToothError> {
        match self {
            TeethSpec::One(n) => ToothNumber::parse_selection(&n.to_string()),
            TeethSpec::List(ns) => ns
                .iter()
                .map(|n| n.to_string().parse::<ToothNumber>())
                .collect(),
            TeethSpec::Text(s) => ToothNumber::parse_selection(s),
        }
    }
}

impl ImplantRequest {
    fn selection(&self) -> ImplantSelection {
        ImplantSelection {
            implant_line: self.implant_line.clone(),
            diameter: self.diameter.clone().map(Scalar::into_text),
            length: self.length.clone().map(Scalar::into_text),
            offset: self.offset.clone().map(Scalar::into_text),
            approach: self.approach,
        }
    }
}

impl PlanRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read request file {}", path.display()))?;
        serde_yml::from_str(&contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("invalid request file {}", path.display()))
    }
}

/// Selections from the flags, if any were given
fn selection_from_args(args: &PlanArgs) -> Option<(String, ImplantSelection)> {
    let teeth = args.teeth.clone()?;
    Some((
        teeth,
        ImplantSelection {
            implant_line: args.line.clone(),
            diameter: args.diameter.clone(),
            length: args.length.clone(),
            offset: args.offset.clone(),
            approach: args.approach,
        },
    ))
}

/// Field-wise merge: flags override the request file
fn merge_case(base: CaseInfo, args: &PlanArgs) -> CaseInfo {
    CaseInfo {
        doctor: args.doctor.clone().or(base.doctor),
        patient: args.patient.clone().or(base.patient),
        case_number: args.case_number.clone().or(base.case_number),
    }
}

pub fn run(args: PlanArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load().with_catalog_override(global.catalog.clone());
    let mut session = Session::open(config)?;

    let request = match &args.request {
        Some(path) => PlanRequest::load(path)?,
        None => PlanRequest::default(),
    };

    let mut case = merge_case(request.case, &args);
    if case.doctor.is_none() {
        case.doctor = session.case.doctor.take();
    }
    session.case = case;

    let mut selections: Vec<(String, TeethSpec, ImplantSelection)> = request
        .implants
        .iter()
        .enumerate()
        .map(|(i, r)| (format!("request #{}", i + 1), r.teeth.clone(), r.selection()))
        .collect();
    if let Some((teeth, selection)) = selection_from_args(&args) {
        selections.push(("command line".to_string(), TeethSpec::Text(teeth), selection));
    } else if args.diameter.is_some() || args.length.is_some() || args.offset.is_some() {
        return Err(miette::miette!(
            help = "pass --teeth, e.g. --teeth 3-5",
            "implant size given without any teeth"
        ));
    }

    if selections.is_empty() {
        return Err(miette::miette!(
            help = "pass --teeth with --diameter/--length/--offset, or --request <FILE>",
            "nothing to plan"
        ));
    }

    for (label, teeth, selection) in selections {
        let outcome = teeth
            .resolve()
            .map_err(miette::Report::new)
            .and_then(|teeth| session.add(&teeth, &selection).map_err(miette::Report::new));

        match outcome {
            Ok(result) => {
                if !global.quiet {
                    let part_number = result
                        .added
                        .iter()
                        .chain(result.replaced.iter())
                        .next()
                        .and_then(|t| session.plan.get(*t))
                        .map(|e| e.row.part_number.clone())
                        .unwrap_or_default();
                    for line in summarize_add(&result, &part_number) {
                        eprintln!("{} {}", style("✓").green(), line);
                    }
                }
            }
            Err(e) if args.skip_errors => {
                eprintln!("{} {}: {}", style("✗").red(), label, e);
            }
            Err(e) => return Err(e.wrap_err(format!("{} rejected", label))),
        }
    }

    let report_format = match global.format {
        OutputFormat::Json => ReportFormat::Json,
        _ => ReportFormat::Md,
    };
    let generated = Local::now();
    let rendered = session.report(report_format, generated)?;

    let output = if args.save {
        Some(
            session
                .config
                .report_dir()
                .join(default_file_name(&session.case, generated, report_format)),
        )
    } else {
        args.output.clone()
    };

    write_output(&rendered, output.as_deref())?;
    if let Some(path) = output {
        if !global.quiet {
            eprintln!(
                "{} Wrote report for {} implant(s) to {}",
                style("✓").green(),
                style(session.plan.len()).cyan(),
                style(path.display()).cyan()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_numbers_and_strings() {
        let yaml = r#"
case:
  doctor: Dr. Molar
  case_number: C-42
implants:
  - teeth: "3-5"
    diameter: 3.5
    length: "8.5"
    offset: 10
  - teeth: [14, 15]
    diameter: 4
    length: 10
    offset: 10
    approach: flap
  - teeth: 8
    implant_line: Primus
"#;
        let request: PlanRequest = serde_yml::from_str(yaml).unwrap();
        assert_eq!(request.case.doctor.as_deref(), Some("Dr. Molar"));
        assert_eq!(request.implants.len(), 3);

        let first = request.implants[0].selection();
        assert_eq!(first.diameter.as_deref(), Some("3.5"));
        assert_eq!(first.length.as_deref(), Some("8.5"));
        assert_eq!(first.offset.as_deref(), Some("10"));
        assert_eq!(request.implants[0].teeth.resolve().unwrap().len(), 3);

        let second = request.implants[1].selection();
        assert_eq!(second.approach, Some(SurgicalApproach::Flap));
        assert_eq!(request.implants[1].teeth.resolve().unwrap().len(), 2);

        let third = request.implants[2].selection();
        assert!(third.diameter.is_none());
        assert_eq!(request.implants[2].teeth.resolve().unwrap().len(), 1);
    }

    #[test]
    fn test_teeth_spec_out_of_range() {
        assert!(matches!(
            TeethSpec::List(vec![3, 33]).resolve(),
            Err(ToothError::OutOfRange(_))
        ));
        assert!(TeethSpec::One(0).resolve().is_err());
    }

    #[test]
    fn test_unknown_request_field_is_rejected() {
        let yaml = "implants:\n  - teeth: 8\n    diamter: 3.5\n";
        assert!(serde_yml::from_str::<PlanRequest>(yaml).is_err());
    }

    #[test]
    fn test_flags_override_request_case() {
        let base = CaseInfo {
            doctor: Some("Dr. File".to_string()),
            patient: Some("Jane Roe".to_string()),
            case_number: None,
        };
        let args = PlanArgs {
            doctor: Some("Dr. Flag".to_string()),
            case_number: Some("C-7".to_string()),
            ..PlanArgs::default()
        };
        let case = merge_case(base, &args);
        assert_eq!(case.doctor.as_deref(), Some("Dr. Flag"));
        assert_eq!(case.patient.as_deref(), Some("Jane Roe"));
        assert_eq!(case.case_number.as_deref(), Some("C-7"));
    }

    #[test]
    fn test_selection_requires_teeth() {
        let args = PlanArgs {
            diameter: Some("3.5".to_string()),
            ..PlanArgs::default()
        };
        assert!(selection_from_args(&args).is_none());

        let args = PlanArgs {
            teeth: Some("8".to_string()),
            diameter: Some("3.5".to_string()),
            line: Some("Primus".to_string()),
            ..PlanArgs::default()
        };
        let (teeth, selection) = selection_from_args(&args).unwrap();
        assert_eq!(teeth, "8");
        assert_eq!(selection.implant_line.as_deref(), Some("Primus"));
        assert!(selection.length.is_none());
    }
}
