//! Core module - catalog lookup, plan validation and configuration

pub mod catalog;
pub mod config;
pub mod plan;
pub mod tooth;

pub use catalog::{
    format_decimal, Catalog, CatalogError, CatalogRow, DrillSequence, DrillStage, DrillStageName,
    SpecKey, REQUIRED_COLUMNS,
};
pub use config::Config;
pub use plan::{
    AddResult, ImplantSelection, PlanEntry, PlanError, PlanManager, PlanState, SurgicalApproach,
};
pub use tooth::{Arch, ToothError, ToothNumber};
