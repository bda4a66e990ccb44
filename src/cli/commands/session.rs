//! `implant-plan session` command - Interactive planning session
//!
//! Runs a menu loop over one [`Session`]. Rejected selections are reported
//! inline and the loop continues; only prompt failures (e.g. no terminal)
//! end the session with an error.

use chrono::Local;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cli::helpers::{join_teeth, summarize_add, write_output};
use crate::cli::table::plan_listing;
use crate::cli::{GlobalOpts, OutputFormat, Session};
use crate::core::catalog::format_decimal;
use crate::core::plan::{ImplantSelection, SurgicalApproach};
use crate::core::tooth::ToothNumber;
use crate::core::Config;
use crate::report::{default_file_name, ReportFormat};

#[derive(clap::Args, Debug, Default)]
pub struct SessionArgs {
    /// Doctor name on the report (skips the prompt)
    #[arg(long)]
    pub doctor: Option<String>,

    /// Patient name on the report (skips the prompt)
    #[arg(long)]
    pub patient: Option<String>,

    /// Case number on the report (skips the prompt)
    #[arg(long = "case")]
    pub case_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Add,
    Review,
    Remove,
    Clear,
    Report,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 6] = [
        MenuAction::Add,
        MenuAction::Review,
        MenuAction::Remove,
        MenuAction::Clear,
        MenuAction::Report,
        MenuAction::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::Add => "Add implant",
            MenuAction::Review => "Review plan",
            MenuAction::Remove => "Remove a tooth",
            MenuAction::Clear => "Clear all",
            MenuAction::Report => "Generate report",
            MenuAction::Quit => "Quit",
        }
    }
}

/// Multi-select label for a tooth; planned teeth are marked
fn tooth_label(tooth: ToothNumber, planned: Option<&str>) -> String {
    match planned {
        Some(part_number) => format!("{:>2} ({}) - planned: {}", tooth.get(), tooth.arch(), part_number),
        None => format!("{:>2} ({})", tooth.get(), tooth.arch()),
    }
}

fn none_if_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn run(args: SessionArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load().with_catalog_override(global.catalog.clone());
    let (mut session, load_error) = Session::open_lenient(config);
    if let Some(e) = load_error {
        eprintln!("{:?}", miette::Report::new(e));
        eprintln!(
            "{} continuing without a catalog; no implant can be matched",
            style("!").yellow()
        );
    } else if !global.quiet {
        println!(
            "{} Loaded {} implant(s) from {}",
            style("✓").green(),
            style(session.plan.catalog().len()).cyan(),
            style(session.config.catalog_path().display()).dim()
        );
    }

    let theme = ColorfulTheme::default();
    prompt_case(&theme, &mut session, args)?;

    loop {
        let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        let choice = Select::with_theme(&theme)
            .with_prompt(format!("Plan: {} implant(s)", session.plan.len()))
            .items(&labels)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match MenuAction::ALL[choice] {
            MenuAction::Add => add_implant(&theme, &mut session)?,
            MenuAction::Review => review(&session)?,
            MenuAction::Remove => remove_tooth(&theme, &mut session)?,
            MenuAction::Clear => clear_all(&theme, &mut session)?,
            MenuAction::Report => generate_report(&theme, &session)?,
            MenuAction::Quit => {
                if session.plan.is_empty()
                    || Confirm::with_theme(&theme)
                        .with_prompt("Quit and discard the current plan?")
                        .default(false)
                        .interact()
                        .into_diagnostic()?
                {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn prompt_case(theme: &ColorfulTheme, session: &mut Session, args: SessionArgs) -> Result<()> {
    let ask = |prompt: &str, given: Option<String>, initial: Option<String>| -> Result<Option<String>> {
        if given.is_some() {
            return Ok(given);
        }
        let mut input = Input::<String>::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(initial) = initial {
            input = input.with_initial_text(initial);
        }
        Ok(none_if_blank(input.interact_text().into_diagnostic()?))
    };

    let doctor = ask("Doctor", args.doctor, session.case.doctor.clone())?;
    let patient = ask("Patient", args.patient, None)?;
    let case_number = ask("Case number", args.case_number, None)?;

    session.case.doctor = doctor;
    session.case.patient = patient;
    session.case.case_number = case_number;
    Ok(())
}

/// Pick one of the catalog's values, or type one when the catalog has none
fn choose_value(theme: &ColorfulTheme, prompt: &str, values: Vec<Decimal>) -> Result<String> {
    if values.is_empty() {
        return Input::<String>::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic();
    }

    let items: Vec<String> = values.into_iter().map(format_decimal).collect();
    let idx = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()
        .into_diagnostic()?;
    Ok(items[idx].clone())
}

fn add_implant(theme: &ColorfulTheme, session: &mut Session) -> Result<()> {
    let labels: Vec<String> = ToothNumber::all()
        .map(|t| {
            let planned = session.plan.get(t).map(|e| e.row.part_number.as_str());
            tooth_label(t, planned)
        })
        .collect();
    let picked = MultiSelect::with_theme(theme)
        .with_prompt("Teeth (space to select, enter to confirm)")
        .items(&labels)
        .interact()
        .into_diagnostic()?;
    let teeth: BTreeSet<ToothNumber> = ToothNumber::all()
        .enumerate()
        .filter(|(i, _)| picked.contains(i))
        .map(|(_, t)| t)
        .collect();

    let planned = session.planned_among(&teeth);
    if !planned.is_empty()
        && !Confirm::with_theme(theme)
            .with_prompt(format!(
                "Replace the existing plan for {}?",
                join_teeth(&planned)
            ))
            .default(false)
            .interact()
            .into_diagnostic()?
    {
        println!("{}", style("Nothing changed").dim());
        return Ok(());
    }

    let catalog = session.plan.catalog();
    let lines = catalog.implant_lines();
    let implant_line = if lines.len() > 1 {
        let idx = Select::with_theme(theme)
            .with_prompt("Implant line")
            .items(&lines)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Some(lines[idx].clone())
    } else {
        None
    };

    let diameter = choose_value(theme, "Diameter (mm)", catalog.diameters())?;
    let length = choose_value(theme, "Length (mm)", catalog.lengths())?;
    let offset = choose_value(theme, "Offset (mm)", catalog.offsets())?;

    let approaches = [SurgicalApproach::Flapless, SurgicalApproach::Flap];
    let default_idx = approaches
        .iter()
        .position(|a| *a == session.plan.default_approach())
        .unwrap_or(0);
    let idx = Select::with_theme(theme)
        .with_prompt("Surgical approach")
        .items(&approaches)
        .default(default_idx)
        .interact()
        .into_diagnostic()?;

    let selection = ImplantSelection {
        implant_line,
        diameter: Some(diameter),
        length: Some(length),
        offset: Some(offset),
        approach: Some(approaches[idx]),
    };

    match session.add(&teeth, &selection) {
        Ok(result) => {
            let part_number = teeth
                .iter()
                .next()
                .and_then(|t| session.plan.get(*t))
                .map(|e| e.row.part_number.clone())
                .unwrap_or_default();
            for line in summarize_add(&result, &part_number) {
                println!("{} {}", style("✓").green(), line);
            }
        }
        Err(e) => eprintln!("{:?}", miette::Report::new(e)),
    }
    Ok(())
}

fn review(session: &Session) -> Result<()> {
    if session.plan.is_empty() {
        println!("{}", style("No implants planned yet").dim());
        return Ok(());
    }
    print!(
        "{}",
        plan_listing(&session.plan.entries_sorted()).render(OutputFormat::Auto)?
    );
    Ok(())
}

fn remove_tooth(theme: &ColorfulTheme, session: &mut Session) -> Result<()> {
    let entries = session.plan.entries_sorted();
    if entries.is_empty() {
        println!("{}", style("No implants planned yet").dim());
        return Ok(());
    }

    let labels: Vec<String> = entries
        .iter()
        .map(|e| tooth_label(e.tooth, Some(&e.row.part_number)))
        .collect();
    let teeth: Vec<ToothNumber> = entries.iter().map(|e| e.tooth).collect();
    let idx = Select::with_theme(theme)
        .with_prompt("Remove which tooth?")
        .items(&labels)
        .interact()
        .into_diagnostic()?;

    if session.plan.remove_entry(teeth[idx]) {
        println!("{} Removed tooth {}", style("✓").green(), teeth[idx]);
    }
    Ok(())
}

fn clear_all(theme: &ColorfulTheme, session: &mut Session) -> Result<()> {
    if session.plan.is_empty() {
        println!("{}", style("No implants planned yet").dim());
        return Ok(());
    }
    let confirmed = Confirm::with_theme(theme)
        .with_prompt(format!("Remove all {} planned implant(s)?", session.plan.len()))
        .default(false)
        .interact()
        .into_diagnostic()?;
    if confirmed {
        session.plan.clear_all();
        println!("{} Plan cleared", style("✓").green());
    }
    Ok(())
}

fn generate_report(theme: &ColorfulTheme, session: &Session) -> Result<()> {
    let formats = [ReportFormat::Md, ReportFormat::Json];
    let labels = ["Markdown", "JSON"];
    let idx = Select::with_theme(theme)
        .with_prompt("Report format")
        .items(&labels)
        .default(0)
        .interact()
        .into_diagnostic()?;
    let format = formats[idx];

    let generated = Local::now();
    let rendered = match session.report(format, generated) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return Ok(());
        }
    };

    let suggested = session
        .config
        .report_dir()
        .join(default_file_name(&session.case, generated, format));
    let path: String = Input::with_theme(theme)
        .with_prompt("Save report to")
        .with_initial_text(suggested.display().to_string())
        .interact_text()
        .into_diagnostic()?;
    let path = PathBuf::from(path.trim());

    match write_output(&rendered, Some(&path)) {
        Ok(()) => println!("{} Report saved to {}", style("✓").green(), style(path.display()).cyan()),
        Err(e) => eprintln!("{:?}", e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_labels() {
        let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        assert_eq!(labels.first(), Some(&"Add implant"));
        assert_eq!(labels.last(), Some(&"Quit"));
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn test_tooth_label() {
        let t8 = ToothNumber::new(8).unwrap();
        let t30 = ToothNumber::new(30).unwrap();
        assert_eq!(tooth_label(t8, None), " 8 (upper)");
        assert_eq!(tooth_label(t30, Some("PBF4010S")), "30 (lower) - planned: PBF4010S");
    }

    #[test]
    fn test_none_if_blank() {
        assert_eq!(none_if_blank("  ".to_string()), None);
        assert_eq!(none_if_blank(" C-42 ".to_string()), Some("C-42".to_string()));
    }
}
