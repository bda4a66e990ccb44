//! Implant reference catalog
//!
//! The catalog is a read-only table of implant specifications loaded once from
//! a CSV file. Each row carries the part number, guide sleeve and the seven
//! stage drilling protocol for one (diameter, length, offset) combination.

use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Column names every catalog file must provide (matched case-insensitively)
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "Implant Line",
    "Implant Part No",
    "Implant Diameter",
    "Implant Length",
    "Guide Sleeve",
    "Drill Length",
    "Offset",
    "Starter Drill",
    "Initial Drill 1",
    "Initial Drill 2",
    "Drill 1",
    "Drill 2",
    "Drill 3",
    "Drill 4",
];

/// Format a decimal without trailing zeros (`10.0` -> `10`, `3.50` -> `3.5`)
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// One stage of the drilling protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillStage {
    /// Stage is skipped for this configuration (`x` in the catalog)
    NotApplicable,
    /// Drilling depth in millimeters
    Depth(Decimal),
}

impl DrillStage {
    pub fn is_applicable(&self) -> bool {
        matches!(self, DrillStage::Depth(_))
    }

    pub fn depth(&self) -> Option<Decimal> {
        match self {
            DrillStage::Depth(d) => Some(*d),
            DrillStage::NotApplicable => None,
        }
    }
}

impl fmt::Display for DrillStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrillStage::Depth(d) => write!(f, "{} mm", format_decimal(*d)),
            DrillStage::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl FromStr for DrillStage {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("x") {
            Ok(DrillStage::NotApplicable)
        } else {
            Decimal::from_str(s).map(DrillStage::Depth)
        }
    }
}

/// The seven drilling stages, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DrillStageName {
    #[serde(rename = "Starter Drill")]
    Starter,
    #[serde(rename = "Initial Drill 1")]
    Initial1,
    #[serde(rename = "Initial Drill 2")]
    Initial2,
    #[serde(rename = "Drill 1")]
    Drill1,
    #[serde(rename = "Drill 2")]
    Drill2,
    #[serde(rename = "Drill 3")]
    Drill3,
    #[serde(rename = "Drill 4")]
    Drill4,
}

impl DrillStageName {
    pub const ALL: [DrillStageName; 7] = [
        DrillStageName::Starter,
        DrillStageName::Initial1,
        DrillStageName::Initial2,
        DrillStageName::Drill1,
        DrillStageName::Drill2,
        DrillStageName::Drill3,
        DrillStageName::Drill4,
    ];

    /// Catalog column holding this stage
    pub fn column(&self) -> &'static str {
        match self {
            DrillStageName::Starter => "Starter Drill",
            DrillStageName::Initial1 => "Initial Drill 1",
            DrillStageName::Initial2 => "Initial Drill 2",
            DrillStageName::Drill1 => "Drill 1",
            DrillStageName::Drill2 => "Drill 2",
            DrillStageName::Drill3 => "Drill 3",
            DrillStageName::Drill4 => "Drill 4",
        }
    }

    /// 1-based step number in the protocol
    pub fn step(&self) -> u8 {
        match self {
            DrillStageName::Starter => 1,
            DrillStageName::Initial1 => 2,
            DrillStageName::Initial2 => 3,
            DrillStageName::Drill1 => 4,
            DrillStageName::Drill2 => 5,
            DrillStageName::Drill3 => 6,
            DrillStageName::Drill4 => 7,
        }
    }

    /// Protocol note printed next to the stage
    pub fn note(&self) -> &'static str {
        match self {
            DrillStageName::Starter => "Initial pilot hole",
            DrillStageName::Initial1 => "First expansion",
            DrillStageName::Initial2 => "Second expansion",
            DrillStageName::Drill1 | DrillStageName::Drill2 | DrillStageName::Drill3 => {
                "Progressive drilling"
            }
            DrillStageName::Drill4 => "Final preparation",
        }
    }
}

impl fmt::Display for DrillStageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Depths for all seven stages of one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillSequence {
    pub starter: DrillStage,
    pub initial_1: DrillStage,
    pub initial_2: DrillStage,
    pub drill_1: DrillStage,
    pub drill_2: DrillStage,
    pub drill_3: DrillStage,
    pub drill_4: DrillStage,
}

impl DrillSequence {
    /// Build a sequence from stages given in protocol order
    pub fn from_stages(stages: [DrillStage; 7]) -> Self {
        let [starter, initial_1, initial_2, drill_1, drill_2, drill_3, drill_4] = stages;
        Self {
            starter,
            initial_1,
            initial_2,
            drill_1,
            drill_2,
            drill_3,
            drill_4,
        }
    }

    pub fn get(&self, name: DrillStageName) -> DrillStage {
        match name {
            DrillStageName::Starter => self.starter,
            DrillStageName::Initial1 => self.initial_1,
            DrillStageName::Initial2 => self.initial_2,
            DrillStageName::Drill1 => self.drill_1,
            DrillStageName::Drill2 => self.drill_2,
            DrillStageName::Drill3 => self.drill_3,
            DrillStageName::Drill4 => self.drill_4,
        }
    }

    /// Stages paired with their names, in protocol order
    pub fn iter(&self) -> impl Iterator<Item = (DrillStageName, DrillStage)> + '_ {
        DrillStageName::ALL.into_iter().map(|name| (name, self.get(name)))
    }

    /// Names of every stage marked not applicable, in protocol order
    pub fn inapplicable(&self) -> Vec<DrillStageName> {
        self.iter()
            .filter(|(_, stage)| !stage.is_applicable())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Catalog lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpecKey {
    pub diameter: Decimal,
    pub length: Decimal,
    pub offset: Decimal,
}

impl SpecKey {
    pub fn new(diameter: Decimal, length: Decimal, offset: Decimal) -> Self {
        Self {
            diameter,
            length,
            offset,
        }
    }
}

impl fmt::Display for SpecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}mm x {}mm (offset {}mm)",
            format_decimal(self.diameter),
            format_decimal(self.length),
            format_decimal(self.offset)
        )
    }
}

/// One implant specification from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub implant_line: String,
    pub part_number: String,
    pub diameter: Decimal,
    pub length: Decimal,
    pub offset: Decimal,
    pub guide_sleeve: String,
    /// Overall drill sequence depth
    pub drill_length: Decimal,
    pub drill_sequence: DrillSequence,
}

impl CatalogRow {
    pub fn key(&self) -> SpecKey {
        SpecKey::new(self.diameter, self.length, self.offset)
    }
}

/// Errors from loading a catalog
#[derive(Debug, Error, miette::Diagnostic)]
pub enum CatalogError {
    #[error("catalog file not found: {}", path.display())]
    #[diagnostic(
        code(implant_plan::catalog::not_found),
        help("pass --catalog <PATH>, set IMPLANT_PLAN_CATALOG, or set `catalog` in implant-plan.yaml")
    )]
    SourceNotFound { path: PathBuf },

    #[error("failed to read catalog {}", path.display())]
    #[diagnostic(code(implant_plan::catalog::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog '{origin}' contains no data")]
    #[diagnostic(code(implant_plan::catalog::empty))]
    EmptyData { origin: String },

    #[error("catalog '{origin}' is missing required columns: {}", missing.join(", "))]
    #[diagnostic(
        code(implant_plan::catalog::schema),
        help("run `implant-plan catalog template` to see the expected header row")
    )]
    Schema { origin: String, missing: Vec<String> },

    #[error("catalog '{origin}' line {line}: {message}")]
    #[diagnostic(code(implant_plan::catalog::parse))]
    Parse {
        origin: String,
        line: u64,
        message: String,
    },
}

/// Column positions resolved from a header row
struct ColumnIndex {
    implant_line: usize,
    part_number: usize,
    diameter: usize,
    length: usize,
    guide_sleeve: usize,
    drill_length: usize,
    offset: usize,
    stages: [usize; 7],
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, origin: &str) -> Result<Self, CatalogError> {
        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let mut missing = Vec::new();
        let mut found = [0usize; 14];
        for (slot, column) in found.iter_mut().zip(REQUIRED_COLUMNS) {
            match header_map.get(&column.to_lowercase()) {
                Some(&idx) => *slot = idx,
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(CatalogError::Schema {
                origin: origin.to_string(),
                missing,
            });
        }

        Ok(Self {
            implant_line: found[0],
            part_number: found[1],
            diameter: found[2],
            length: found[3],
            guide_sleeve: found[4],
            drill_length: found[5],
            offset: found[6],
            stages: [
                found[7], found[8], found[9], found[10], found[11], found[12], found[13],
            ],
        })
    }
}

/// Parses individual cells of one record, tagging failures with the line
struct RowParser<'a> {
    record: &'a StringRecord,
    origin: &'a str,
    line: u64,
}

impl RowParser<'_> {
    fn error(&self, message: String) -> CatalogError {
        CatalogError::Parse {
            origin: self.origin.to_string(),
            line: self.line,
            message,
        }
    }

    fn text(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("")
    }

    fn required_text(&self, idx: usize, column: &str) -> Result<String, CatalogError> {
        let value = self.text(idx);
        if value.is_empty() {
            return Err(self.error(format!("column '{}' is empty", column)));
        }
        Ok(value.to_string())
    }

    fn decimal(&self, idx: usize, column: &str) -> Result<Decimal, CatalogError> {
        let value = self.text(idx);
        Decimal::from_str(value).map_err(|_| {
            self.error(format!("column '{}': '{}' is not a number", column, value))
        })
    }

    fn stage(&self, idx: usize, name: DrillStageName) -> Result<DrillStage, CatalogError> {
        let value = self.text(idx);
        value.parse().map_err(|_| {
            self.error(format!(
                "column '{}': '{}' is neither a depth nor 'x'",
                name.column(),
                value
            ))
        })
    }
}

/// Immutable in-memory implant catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
    source: Option<PathBuf>,
}

impl Catalog {
    /// A catalog with no rows; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog directly from rows, in lookup order
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        Self { rows, source: None }
    }

    /// Load a catalog from a CSV file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut catalog = Self::from_reader(BufReader::new(file), &path.display().to_string())?;
        catalog.source = Some(path.to_path_buf());

        info!(
            rows = catalog.len(),
            path = %path.display(),
            "implant catalog loaded"
        );

        Ok(catalog)
    }

    /// Load a catalog from any CSV reader; `origin` names it in errors
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, CatalogError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| CatalogError::Parse {
                origin: origin.to_string(),
                line: 1,
                message: e.to_string(),
            })?
            .clone();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(CatalogError::EmptyData {
                origin: origin.to_string(),
            });
        }

        let columns = ColumnIndex::resolve(&headers, origin)?;

        let mut rows = Vec::new();
        for (row_idx, result) in rdr.records().enumerate() {
            let line = row_idx as u64 + 2;
            let record = result.map_err(|e| CatalogError::Parse {
                origin: origin.to_string(),
                line: e.position().map(|p| p.line()).unwrap_or(line),
                message: e.to_string(),
            })?;

            // Blank spreadsheet rows export as a line of empty cells
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            rows.push(Self::parse_row(&record, &columns, origin, line)?);
        }

        if rows.is_empty() {
            return Err(CatalogError::EmptyData {
                origin: origin.to_string(),
            });
        }

        warn_duplicates(&rows);

        Ok(Self { rows, source: None })
    }

    fn parse_row(
        record: &StringRecord,
        columns: &ColumnIndex,
        origin: &str,
        line: u64,
    ) -> Result<CatalogRow, CatalogError> {
        let p = RowParser {
            record,
            origin,
            line,
        };

        let mut stages = [DrillStage::NotApplicable; 7];
        for ((slot, &idx), name) in stages
            .iter_mut()
            .zip(columns.stages.iter())
            .zip(DrillStageName::ALL)
        {
            *slot = p.stage(idx, name)?;
        }

        Ok(CatalogRow {
            implant_line: p.required_text(columns.implant_line, "Implant Line")?,
            part_number: p.required_text(columns.part_number, "Implant Part No")?,
            diameter: p.decimal(columns.diameter, "Implant Diameter")?,
            length: p.decimal(columns.length, "Implant Length")?,
            offset: p.decimal(columns.offset, "Offset")?,
            guide_sleeve: p.text(columns.guide_sleeve).to_string(),
            drill_length: p.decimal(columns.drill_length, "Drill Length")?,
            drill_sequence: DrillSequence::from_stages(stages),
        })
    }

    /// Exact lookup on (diameter, length, offset); the first row in load order wins
    pub fn find(&self, key: &SpecKey) -> Option<&CatalogRow> {
        let found = self.rows.iter().find(|row| row.key() == *key);
        debug!(%key, part_number = found.map(|r| r.part_number.as_str()), "catalog lookup");
        found
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// File the catalog was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn implant_lines(&self) -> Vec<String> {
        let lines: BTreeSet<&str> = self.rows.iter().map(|r| r.implant_line.as_str()).collect();
        lines.into_iter().map(String::from).collect()
    }

    pub fn diameters(&self) -> Vec<Decimal> {
        self.distinct(|r| r.diameter)
    }

    pub fn lengths(&self) -> Vec<Decimal> {
        self.distinct(|r| r.length)
    }

    pub fn offsets(&self) -> Vec<Decimal> {
        self.distinct(|r| r.offset)
    }

    fn distinct(&self, field: impl Fn(&CatalogRow) -> Decimal) -> Vec<Decimal> {
        let values: BTreeSet<Decimal> = self.rows.iter().map(|r| field(r).normalize()).collect();
        values.into_iter().collect()
    }
}

fn warn_duplicates(rows: &[CatalogRow]) {
    let mut first_seen: BTreeMap<SpecKey, &str> = BTreeMap::new();
    for row in rows {
        match first_seen.get(&row.key()) {
            Some(winner) => warn!(
                key = %row.key(),
                kept = *winner,
                shadowed = row.part_number.as_str(),
                "duplicate catalog key; later row is unreachable"
            ),
            None => {
                first_seen.insert(row.key(), row.part_number.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "Implant Line,Implant Part No,Implant Diameter,Implant Length,Guide Sleeve,Drill Length,Offset,Starter Drill,Initial Drill 1,Initial Drill 2,Drill 1,Drill 2,Drill 3,Drill 4";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn key(d: &str, l: &str, o: &str) -> SpecKey {
        SpecKey::new(dec(d), dec(l), dec(o))
    }

    fn parse(body: &str) -> Result<Catalog, CatalogError> {
        let csv = format!("{}\n{}", HEADER, body);
        Catalog::from_reader(Cursor::new(csv), "test.csv")
    }

    #[test]
    fn test_load_and_find() {
        let catalog = parse(
            "Primus,PBF3508S,3.5,8.5,CGSC-5304,18.5,10,8.5,8.5,8.5,8.5,8.5,8.5,8.5\n\
             Primus,PBF4010S,4.0,10.0,CGSC-5305,20,11.5,10,10,10,10,10,x,x\n",
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let row = catalog.find(&key("3.5", "8.5", "10")).unwrap();
        assert_eq!(row.part_number, "PBF3508S");
        assert_eq!(row.guide_sleeve, "CGSC-5304");
        assert_eq!(row.drill_length, dec("18.5"));
        assert_eq!(row.drill_sequence.drill_4, DrillStage::Depth(dec("8.5")));

        // numeric equality, not textual
        let row = catalog.find(&key("4", "10", "11.50")).unwrap();
        assert_eq!(row.part_number, "PBF4010S");
        assert_eq!(row.drill_sequence.drill_3, DrillStage::NotApplicable);
    }

    #[test]
    fn test_find_miss_is_none() {
        let catalog = parse("Primus,PBF3508S,3.5,8.5,CGSC-5304,18.5,10,8.5,8.5,8.5,8.5,8.5,8.5,8.5").unwrap();
        assert!(catalog.find(&key("3.5", "8.5", "99")).is_none());
        assert!(Catalog::empty().find(&key("3.5", "8.5", "10")).is_none());
    }

    #[test]
    fn test_find_is_deterministic_and_first_match_wins() {
        let catalog = parse(
            "Primus,FIRST,3.5,8.5,G1,18.5,10,1,1,1,1,1,1,1\n\
             Primus,SECOND,3.5,8.5,G2,18.5,10,1,1,1,1,1,1,1\n",
        )
        .unwrap();
        let k = key("3.5", "8.5", "10");
        let a = catalog.find(&k).unwrap();
        let b = catalog.find(&k).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.part_number, "FIRST");
    }

    #[test]
    fn test_column_order_and_case_are_free() {
        let csv = "drill 4,DRILL 3,Drill 2,Drill 1,Initial Drill 2,Initial Drill 1,Starter Drill,Offset,Drill Length,Guide Sleeve,Implant Length,Implant Diameter,Implant Part No,Implant Line,Notes\n\
                   7,6,5,4,3,2,1,13,22,CGSC-1,11.5,5.0,PBF5011S,Primus,ignored\n";
        let catalog = Catalog::from_reader(Cursor::new(csv), "shuffled.csv").unwrap();
        let row = catalog.find(&key("5", "11.5", "13")).unwrap();
        assert_eq!(row.drill_sequence.starter, DrillStage::Depth(dec("1")));
        assert_eq!(row.drill_sequence.drill_4, DrillStage::Depth(dec("7")));
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let csv = "Implant Line,Implant Part No,Implant Diameter\nPrimus,P1,3.5\n";
        let err = Catalog::from_reader(Cursor::new(csv), "short.csv").unwrap_err();
        match err {
            CatalogError::Schema { missing, .. } => {
                assert_eq!(missing.len(), 11);
                assert!(missing.contains(&"Offset".to_string()));
                assert!(missing.contains(&"Drill 4".to_string()));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sources() {
        let err = Catalog::from_reader(Cursor::new(""), "blank.csv").unwrap_err();
        assert!(matches!(err, CatalogError::EmptyData { .. }));

        let err = parse("").unwrap_err();
        assert!(matches!(err, CatalogError::EmptyData { .. }));
    }

    #[test]
    fn test_bad_number_is_parse_error_with_line() {
        let err = parse(
            "Primus,P1,3.5,8.5,G,18.5,10,1,1,1,1,1,1,1\n\
             Primus,P2,wide,8.5,G,18.5,10,1,1,1,1,1,1,1\n",
        )
        .unwrap_err();
        match err {
            CatalogError::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("Implant Diameter"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_stage_is_parse_error() {
        let err = parse("Primus,P1,3.5,8.5,G,18.5,10,1,1,1,1,1,n/a,1").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let err = parse("Primus,P1,3.5,8.5\n").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::SourceNotFound { .. }));
    }

    #[test]
    fn test_load_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(
            &path,
            format!("{}\nPrimus,P1,3.5,8.5,G,18.5,10,1,1,1,1,1,1,1\n", HEADER),
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.source(), Some(path.as_path()));
    }

    #[test]
    fn test_drill_stage_parsing() {
        assert_eq!("x".parse::<DrillStage>().unwrap(), DrillStage::NotApplicable);
        assert_eq!(" X ".parse::<DrillStage>().unwrap(), DrillStage::NotApplicable);
        assert_eq!(
            "8.5".parse::<DrillStage>().unwrap(),
            DrillStage::Depth(dec("8.5"))
        );
        assert!("".parse::<DrillStage>().is_err());
        assert!("xx".parse::<DrillStage>().is_err());
    }

    #[test]
    fn test_drill_stage_display() {
        assert_eq!(DrillStage::Depth(dec("10.0")).to_string(), "10 mm");
        assert_eq!(DrillStage::NotApplicable.to_string(), "N/A");
    }

    #[test]
    fn test_inapplicable_stages_in_protocol_order() {
        let d = DrillStage::Depth(Decimal::ONE);
        let na = DrillStage::NotApplicable;
        let seq = DrillSequence::from_stages([d, na, d, d, d, na, d]);
        assert_eq!(
            seq.inapplicable(),
            vec![DrillStageName::Initial1, DrillStageName::Drill3]
        );
        assert_eq!(seq.iter().count(), 7);
    }

    #[test]
    fn test_stage_metadata() {
        assert_eq!(DrillStageName::Drill3.to_string(), "Drill 3");
        assert_eq!(DrillStageName::Starter.step(), 1);
        assert_eq!(DrillStageName::Drill4.step(), 7);
        assert_eq!(DrillStageName::Drill4.note(), "Final preparation");
        let names: Vec<&str> = DrillStageName::ALL.iter().map(|n| n.column()).collect();
        assert_eq!(names, &REQUIRED_COLUMNS[7..]);
    }

    #[test]
    fn test_options_are_sorted_and_distinct() {
        let catalog = parse(
            "Primus,A,4.0,10,G,20,10,1,1,1,1,1,1,1\n\
             Primus,B,3.5,8.5,G,18.5,10,1,1,1,1,1,1,1\n\
             Primus,C,4,8.5,G,18.5,11.5,1,1,1,1,1,1,1\n",
        )
        .unwrap();
        assert_eq!(catalog.diameters(), vec![dec("3.5"), dec("4")]);
        assert_eq!(catalog.lengths(), vec![dec("8.5"), dec("10")]);
        assert_eq!(catalog.offsets(), vec![dec("10"), dec("11.5")]);
        assert_eq!(catalog.implant_lines(), vec!["Primus".to_string()]);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(dec("10.0")), "10");
        assert_eq!(format_decimal(dec("3.50")), "3.5");
        assert_eq!(format_decimal(dec("11.5")), "11.5");
    }
}
