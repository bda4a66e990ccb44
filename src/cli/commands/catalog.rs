//! `implant-plan catalog` command - Browse and query the implant catalog

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::table::{catalog_listing, Listing};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::{format_decimal, Catalog, REQUIRED_COLUMNS};
use crate::core::plan::{ImplantSelection, PlanError};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List every catalog row
    List,

    /// Look up the implant for a diameter/length/offset
    Find(FindArgs),

    /// Show the distinct implant lines and sizes on offer
    Options,

    /// Print the CSV header (and an example row) a catalog file must have
    Template,
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Implant diameter in mm
    #[arg(long, short = 'd')]
    pub diameter: String,

    /// Implant length in mm
    #[arg(long, short = 'l')]
    pub length: String,

    /// Offset in mm
    #[arg(long, short = 'o')]
    pub offset: String,
}

/// Distinct values offered for each selection field
#[derive(Debug, Serialize)]
struct CatalogOptions {
    implant_lines: Vec<String>,
    diameters: Vec<String>,
    lengths: Vec<String>,
    offsets: Vec<String>,
}

const TEMPLATE_EXAMPLE_ROW: [&str; 14] = [
    "Primus", "PBF3508S", "3.5", "8.5", "CGSC-5304", "18.5", "10", "4", "8.5", "8.5", "8.5", "x",
    "x", "x",
];

pub fn run(cmd: CatalogCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CatalogCommands::Template => run_template(global),
        other => {
            let config = Config::load().with_catalog_override(global.catalog.clone());
            let catalog = Catalog::load(&config.catalog_path())?;
            match other {
                CatalogCommands::List => run_list(&catalog, global),
                CatalogCommands::Find(args) => run_find(&catalog, args, global),
                CatalogCommands::Options => run_options(&catalog, global),
                CatalogCommands::Template => run_template(global),
            }
        }
    }
}

fn run_list(catalog: &Catalog, global: &GlobalOpts) -> Result<()> {
    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(catalog.rows()).into_diagnostic()?
        );
        return Ok(());
    }

    print!("{}", catalog_listing(catalog.rows()).render(global.format)?);
    if global.format == OutputFormat::Auto && !global.quiet {
        println!(
            "\n{} implant(s) from {}",
            style(catalog.len()).cyan(),
            style(
                catalog
                    .source()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            )
            .dim()
        );
    }
    Ok(())
}

fn run_find(catalog: &Catalog, args: FindArgs, global: &GlobalOpts) -> Result<()> {
    let key = ImplantSelection::new(args.diameter, args.length, args.offset).spec_key()?;

    let Some(row) = catalog.find(&key) else {
        return Err(PlanError::NoMatchingImplant { key }.into());
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(row).into_diagnostic()?);
        }
        OutputFormat::Auto => {
            println!(
                "{} {} {}",
                style("✓").green(),
                style(&row.part_number).cyan().bold(),
                style(key).dim()
            );
            println!("   Implant line:  {}", row.implant_line);
            println!("   Guide sleeve:  {}", style(&row.guide_sleeve).yellow());
            println!("   Drill length:  {} mm", format_decimal(row.drill_length));
            for (name, stage) in row.drill_sequence.iter() {
                let depth = if stage.is_applicable() {
                    style(stage.to_string()).white()
                } else {
                    style(stage.to_string()).red()
                };
                println!("   {:<15} {}", format!("{}:", name), depth);
            }
            let inapplicable = row.drill_sequence.inapplicable();
            if !inapplicable.is_empty() && !global.quiet {
                println!(
                    "\n{} drill sequence is incomplete; this implant cannot be planned",
                    style("!").yellow()
                );
            }
        }
        format => {
            print!("{}", catalog_listing(std::slice::from_ref(row)).render(format)?);
        }
    }
    Ok(())
}

fn run_options(catalog: &Catalog, global: &GlobalOpts) -> Result<()> {
    let fmt = |values: Vec<Decimal>| values.into_iter().map(format_decimal).collect::<Vec<_>>();
    let options = CatalogOptions {
        implant_lines: catalog.implant_lines(),
        diameters: fmt(catalog.diameters()),
        lengths: fmt(catalog.lengths()),
        offsets: fmt(catalog.offsets()),
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&options).into_diagnostic()?);
        }
        OutputFormat::Auto => {
            println!("{:<15} {}", style("Implant lines").bold(), options.implant_lines.join(", "));
            println!("{:<15} {}", style("Diameters").bold(), options.diameters.join(", "));
            println!("{:<15} {}", style("Lengths").bold(), options.lengths.join(", "));
            println!("{:<15} {}", style("Offsets").bold(), options.offsets.join(", "));
        }
        format => {
            let mut listing = Listing::new(["Field", "Values"]);
            for (field, values) in [
                ("implant_lines", &options.implant_lines),
                ("diameters", &options.diameters),
                ("lengths", &options.lengths),
                ("offsets", &options.offsets),
            ] {
                listing.push(vec![field.to_string(), values.join(" ")]);
            }
            print!("{}", listing.render(format)?);
        }
    }
    Ok(())
}

fn run_template(global: &GlobalOpts) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(REQUIRED_COLUMNS).into_diagnostic()?;
    wtr.write_record(TEMPLATE_EXAMPLE_ROW).into_diagnostic()?;
    let bytes = wtr.into_inner().into_diagnostic()?;
    print!("{}", String::from_utf8(bytes).into_diagnostic()?);

    if !global.quiet {
        eprintln!(
            "{} drill stage cells take a depth in mm, or {} when the stage does not apply",
            style("Note:").dim(),
            style("x").yellow()
        );
    }
    Ok(())
}
