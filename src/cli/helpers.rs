//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::catalog::{format_decimal, DrillStage};
use crate::core::plan::AddResult;
use crate::core::tooth::ToothNumber;

/// Join tooth numbers for display ("3, 4, 5")
pub fn join_teeth(teeth: &[ToothNumber]) -> String {
    teeth
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn teeth_noun(count: usize) -> &'static str {
    if count == 1 {
        "tooth"
    } else {
        "teeth"
    }
}

/// User-facing summary lines for a successful add
pub fn summarize_add(result: &AddResult, part_number: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.added.is_empty() {
        lines.push(format!(
            "Implant {} added to plan for {} {}",
            part_number,
            teeth_noun(result.added.len()),
            join_teeth(&result.added)
        ));
    }
    if !result.replaced.is_empty() {
        lines.push(format!(
            "Implant {} replaced existing plan for {} {}",
            part_number,
            teeth_noun(result.replaced.len()),
            join_teeth(&result.replaced)
        ));
    }
    lines
}

/// Catalog cell for a drill stage: the bare depth, or `x`
pub fn stage_cell(stage: DrillStage) -> String {
    match stage.depth() {
        Some(depth) => format_decimal(depth),
        None => "x".to_string(),
    }
}

/// Write `content` to `path`, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
