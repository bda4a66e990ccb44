//! Treatment plan management
//!
//! The [`PlanManager`] owns the catalog and the per-session plan. Every
//! mutation either succeeds completely or is rejected before the plan is
//! touched, and no two entries ever share a tooth.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::core::catalog::{Catalog, CatalogRow, DrillStageName, SpecKey};
use crate::core::tooth::ToothNumber;

/// Surgical access technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurgicalApproach {
    Flap,
    #[default]
    Flapless,
}

impl fmt::Display for SurgicalApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurgicalApproach::Flap => write!(f, "flap"),
            SurgicalApproach::Flapless => write!(f, "flapless"),
        }
    }
}

impl FromStr for SurgicalApproach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flap" => Ok(SurgicalApproach::Flap),
            "flapless" => Ok(SurgicalApproach::Flapless),
            _ => Err(format!(
                "Invalid surgical approach: {}. Use 'flap' or 'flapless'",
                s
            )),
        }
    }
}

/// Raw user inputs for one add operation
///
/// Numbers stay as text until validation so that a blank or malformed field
/// is reported as incomplete input rather than silently defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplantSelection {
    /// Defaults to the matched row's implant line
    pub implant_line: Option<String>,
    pub diameter: Option<String>,
    pub length: Option<String>,
    pub offset: Option<String>,
    /// Defaults to the manager's default approach
    pub approach: Option<SurgicalApproach>,
}

impl ImplantSelection {
    pub fn new(
        diameter: impl Into<String>,
        length: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        Self {
            diameter: Some(diameter.into()),
            length: Some(length.into()),
            offset: Some(offset.into()),
            ..Self::default()
        }
    }

    pub fn with_implant_line(mut self, line: impl Into<String>) -> Self {
        self.implant_line = Some(line.into());
        self
    }

    pub fn with_approach(mut self, approach: SurgicalApproach) -> Self {
        self.approach = Some(approach);
        self
    }

    /// Parse the three key fields, collecting every one that is missing or not a number
    pub fn spec_key(&self) -> Result<SpecKey, PlanError> {
        fn field(value: &Option<String>) -> Option<Decimal> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .and_then(|v| Decimal::from_str(v).ok())
        }

        let diameter = field(&self.diameter);
        let length = field(&self.length);
        let offset = field(&self.offset);

        match (diameter, length, offset) {
            (Some(d), Some(l), Some(o)) => Ok(SpecKey::new(d, l, o)),
            _ => {
                let fields = [("diameter", diameter), ("length", length), ("offset", offset)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect();
                Err(PlanError::IncompleteInput { fields })
            }
        }
    }
}

/// One tooth's planned implant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub tooth: ToothNumber,
    pub implant_line: String,
    pub diameter: Decimal,
    pub length: Decimal,
    pub offset: Decimal,
    pub approach: SurgicalApproach,
    /// Copy of the catalog row taken when the entry was created
    pub row: CatalogRow,
}

/// Outcome of a successful add, used to compose the user-facing summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddResult {
    pub added: Vec<ToothNumber>,
    pub replaced: Vec<ToothNumber>,
}

/// Logical plan state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Empty,
    NonEmpty,
}

/// Reasons an add is rejected; the plan is unchanged in every case
#[derive(Debug, Error, miette::Diagnostic, PartialEq, Eq)]
pub enum PlanError {
    #[error("no teeth selected")]
    #[diagnostic(code(implant_plan::plan::no_selection), help("select at least one tooth (1-32)"))]
    NoSelection,

    #[error("incomplete implant specification: {} missing or not a number", fields.join(", "))]
    #[diagnostic(
        code(implant_plan::plan::incomplete_input),
        help("fill in diameter, length and offset")
    )]
    IncompleteInput { fields: Vec<String> },

    #[error("no matching implant found in catalog for {key}")]
    #[diagnostic(
        code(implant_plan::plan::no_matching_implant),
        help("run `implant-plan catalog options` to list available sizes")
    )]
    NoMatchingImplant { key: SpecKey },

    #[error(
        "implant {part_number} has an incompatible drill sequence: {} not applicable",
        stages.iter().map(|s| s.column()).collect::<Vec<_>>().join(", ")
    )]
    #[diagnostic(
        code(implant_plan::plan::incompatible_drill_sequence),
        help("choose a different diameter, length or offset")
    )]
    IncompatibleDrillSequence {
        part_number: String,
        stages: Vec<DrillStageName>,
    },
}

/// Owns the catalog and the plan for one session
#[derive(Debug)]
pub struct PlanManager {
    catalog: Catalog,
    default_approach: SurgicalApproach,
    entries: Vec<PlanEntry>,
}

impl PlanManager {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            default_approach: SurgicalApproach::default(),
            entries: Vec::new(),
        }
    }

    /// Approach used when a selection does not name one
    pub fn with_default_approach(mut self, approach: SurgicalApproach) -> Self {
        self.default_approach = approach;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn default_approach(&self) -> SurgicalApproach {
        self.default_approach
    }

    /// Validate a selection and plan it for every tooth in `teeth`
    ///
    /// Checks run in a fixed order: tooth selection, input completeness,
    /// catalog match, drill sequence. Existing entries for the same teeth are
    /// replaced.
    pub fn add_entries(
        &mut self,
        teeth: &BTreeSet<ToothNumber>,
        selection: &ImplantSelection,
    ) -> Result<AddResult, PlanError> {
        if teeth.is_empty() {
            return Err(PlanError::NoSelection);
        }

        let key = selection.spec_key()?;

        let row = self
            .catalog
            .find(&key)
            .ok_or(PlanError::NoMatchingImplant { key })?
            .clone();

        let stages = row.drill_sequence.inapplicable();
        if !stages.is_empty() {
            return Err(PlanError::IncompatibleDrillSequence {
                part_number: row.part_number,
                stages,
            });
        }

        let implant_line = selection
            .implant_line
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .unwrap_or_else(|| row.implant_line.clone());
        let approach = selection.approach.unwrap_or(self.default_approach);

        let mut result = AddResult::default();
        for &tooth in teeth {
            if self.remove_entry(tooth) {
                result.replaced.push(tooth);
            } else {
                result.added.push(tooth);
            }

            self.entries.push(PlanEntry {
                tooth,
                implant_line: implant_line.clone(),
                diameter: key.diameter,
                length: key.length,
                offset: key.offset,
                approach,
                row: row.clone(),
            });
        }

        debug!(
            part_number = row.part_number.as_str(),
            added = result.added.len(),
            replaced = result.replaced.len(),
            "plan entries added"
        );

        Ok(result)
    }

    /// Remove the entry for `tooth`; returns whether one existed
    pub fn remove_entry(&mut self, tooth: ToothNumber) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.tooth != tooth);
        let removed = self.entries.len() != before;
        if removed {
            debug!(%tooth, "plan entry removed");
        }
        removed
    }

    pub fn clear_all(&mut self) {
        debug!(count = self.entries.len(), "plan cleared");
        self.entries.clear();
    }

    /// All entries ordered by tooth number
    pub fn entries_sorted(&self) -> Vec<&PlanEntry> {
        let mut sorted: Vec<&PlanEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.tooth);
        sorted
    }

    /// Entries in the order they were added
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, tooth: ToothNumber) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.tooth == tooth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> PlanState {
        if self.entries.is_empty() {
            PlanState::Empty
        } else {
            PlanState::NonEmpty
        }
    }
}
