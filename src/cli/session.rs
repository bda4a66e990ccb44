//! Process-lifetime planning session
//!
//! A [`Session`] ties the loaded configuration to one [`PlanManager`] and the
//! case details that go on the report. Nothing is persisted: the plan lives
//! exactly as long as the session value.

use chrono::{DateTime, Local};
use std::collections::BTreeSet;

use crate::core::catalog::{Catalog, CatalogError};
use crate::core::config::Config;
use crate::core::plan::{AddResult, ImplantSelection, PlanError, PlanManager};
use crate::core::tooth::ToothNumber;
use crate::report::{CaseInfo, ProtocolReport, ReportError, ReportFormat};

#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub case: CaseInfo,
    pub plan: PlanManager,
}

impl Session {
    /// Build a session around an already loaded catalog
    pub fn with_catalog(config: Config, catalog: Catalog) -> Self {
        let plan = PlanManager::new(catalog).with_default_approach(config.default_approach());
        let case = CaseInfo {
            doctor: config.doctor.clone(),
            ..CaseInfo::default()
        };
        Self { config, case, plan }
    }

    /// Load the configured catalog; failure is returned to the caller
    pub fn open(config: Config) -> Result<Self, CatalogError> {
        let catalog = Catalog::load(&config.catalog_path())?;
        Ok(Self::with_catalog(config, catalog))
    }

    /// Load the configured catalog, falling back to an empty one on failure
    ///
    /// Every lookup in a session opened on an empty catalog misses, so the
    /// error is handed back for the caller to show.
    pub fn open_lenient(config: Config) -> (Self, Option<CatalogError>) {
        match Catalog::load(&config.catalog_path()) {
            Ok(catalog) => (Self::with_catalog(config, catalog), None),
            Err(e) => {
                tracing::warn!(error = %e, "continuing with an empty catalog");
                (Self::with_catalog(config, Catalog::empty()), Some(e))
            }
        }
    }

    /// Add a selection; a configured implant line fills in an unnamed one
    pub fn add(
        &mut self,
        teeth: &BTreeSet<ToothNumber>,
        selection: &ImplantSelection,
    ) -> Result<AddResult, PlanError> {
        let mut selection = selection.clone();
        if selection.implant_line.is_none() {
            selection.implant_line = self.config.implant_line.clone();
        }
        self.plan.add_entries(teeth, &selection)
    }

    /// Teeth in `teeth` that already have a plan entry
    pub fn planned_among(&self, teeth: &BTreeSet<ToothNumber>) -> Vec<ToothNumber> {
        teeth
            .iter()
            .copied()
            .filter(|t| self.plan.get(*t).is_some())
            .collect()
    }

    pub fn report(
        &self,
        format: ReportFormat,
        generated: DateTime<Local>,
    ) -> Result<String, ReportError> {
        ProtocolReport::new(&self.case, &self.plan, generated)?.render(format)
    }
}
