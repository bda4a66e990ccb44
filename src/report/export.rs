//! Flattened plan rows handed to report renderers

use serde::Serialize;

use crate::core::catalog::{format_decimal, DrillStageName};
use crate::core::plan::{PlanEntry, PlanManager, SurgicalApproach};
use crate::core::tooth::Arch;

/// One drilling step as printed in a protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStage {
    pub step: u8,
    pub name: DrillStageName,
    /// `"<depth> mm"` or `"N/A"`
    pub depth: String,
    pub note: &'static str,
}

/// One planned implant with every value already formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub tooth: u8,
    pub arch: Arch,
    pub implant_line: String,
    pub diameter: String,
    pub length: String,
    pub offset: String,
    pub approach: SurgicalApproach,
    pub part_number: String,
    pub guide_sleeve: String,
    pub drill_length: String,
    pub drill_sequence: Vec<ExportStage>,
}

impl ExportRow {
    pub fn from_entry(entry: &PlanEntry) -> Self {
        Self {
            tooth: entry.tooth.get(),
            arch: entry.tooth.arch(),
            implant_line: entry.implant_line.clone(),
            diameter: format_decimal(entry.diameter),
            length: format_decimal(entry.length),
            offset: format_decimal(entry.offset),
            approach: entry.approach,
            part_number: entry.row.part_number.clone(),
            guide_sleeve: entry.row.guide_sleeve.clone(),
            drill_length: format_decimal(entry.row.drill_length),
            drill_sequence: entry
                .row
                .drill_sequence
                .iter()
                .map(|(name, stage)| ExportStage {
                    step: name.step(),
                    name,
                    depth: stage.to_string(),
                    note: name.note(),
                })
                .collect(),
        }
    }
}

/// Export rows for the whole plan, in tooth order
pub fn export_rows(plan: &PlanManager) -> Vec<ExportRow> {
    plan.entries_sorted()
        .into_iter()
        .map(ExportRow::from_entry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Catalog, CatalogRow, DrillSequence, DrillStage};
    use crate::core::plan::ImplantSelection;
    use crate::core::tooth::ToothNumber;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;
    use std::str::FromStr;

    fn plan() -> PlanManager {
        let depth = DrillStage::Depth(Decimal::from_str("8.50").unwrap());
        PlanManager::new(Catalog::from_rows(vec![CatalogRow {
            implant_line: "Primus".to_string(),
            part_number: "PBF3508S".to_string(),
            diameter: Decimal::from_str("3.5").unwrap(),
            length: Decimal::from_str("8.5").unwrap(),
            offset: Decimal::from_str("10").unwrap(),
            guide_sleeve: "CGSC-5304".to_string(),
            drill_length: Decimal::from_str("18.5").unwrap(),
            drill_sequence: DrillSequence::from_stages([depth; 7]),
        }]))
    }

    #[test]
    fn test_export_rows_follow_tooth_order() {
        let mut pm = plan();
        let selection = ImplantSelection::new("3.5", "8.5", "10.0");
        for n in [19, 8] {
            let teeth: BTreeSet<ToothNumber> = [ToothNumber::new(n).unwrap()].into();
            pm.add_entries(&teeth, &selection).unwrap();
        }

        let rows = export_rows(&pm);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tooth, 8);
        assert_eq!(rows[0].arch, Arch::Upper);
        assert_eq!(rows[1].tooth, 19);
        assert_eq!(rows[1].arch, Arch::Lower);

        let row = &rows[0];
        assert_eq!(row.part_number, "PBF3508S");
        assert_eq!(row.offset, "10");
        assert_eq!(row.drill_length, "18.5");
        assert_eq!(row.approach, SurgicalApproach::Flapless);
        assert_eq!(row.drill_sequence.len(), 7);
        assert_eq!(row.drill_sequence[0].depth, "8.5 mm");
        assert_eq!(row.drill_sequence[6].note, "Final preparation");
    }

    #[test]
    fn test_export_json_shape() {
        let mut pm = plan();
        let teeth: BTreeSet<ToothNumber> = [ToothNumber::new(8).unwrap()].into();
        pm.add_entries(&teeth, &ImplantSelection::new("3.5", "8.5", "10"))
            .unwrap();

        let json = serde_json::to_value(export_rows(&pm)).unwrap();
        assert_eq!(json[0]["tooth"], 8);
        assert_eq!(json[0]["approach"], "flapless");
        assert_eq!(json[0]["drill_sequence"][5]["name"], "Drill 3");
    }
}
