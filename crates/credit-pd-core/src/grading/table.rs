//! Grade / PD lookup: a monotone step function from a normalized
//! psychometric score to a letter grade and its baseline default probability.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditPdError;
use crate::types::{Probability, Score};
use crate::CreditPdResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the grade table: every score up to and including
/// `upper_bound` that is above the previous row's bound maps to `grade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTableEntry {
    pub upper_bound: Score,
    pub grade: String,
    pub pd: Probability,
}

impl GradeTableEntry {
    fn new(upper_bound: Decimal, grade: &str, pd: Decimal) -> Self {
        Self {
            upper_bound,
            grade: grade.to_string(),
            pd,
        }
    }
}

/// Result of resolving a score against the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeLookup {
    pub grade: String,
    pub pd: Probability,
    pub upper_bound: Score,
}

impl From<&GradeTableEntry> for GradeLookup {
    fn from(entry: &GradeTableEntry) -> Self {
        Self {
            grade: entry.grade.clone(),
            pd: entry.pd,
            upper_bound: entry.upper_bound,
        }
    }
}

/// Validated, immutable grade table sorted ascending by upper bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GradeTable {
    entries: Vec<GradeTableEntry>,
}

impl<'de> Deserialize<'de> for GradeTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<GradeTableEntry>::deserialize(deserializer)?;
        GradeTable::new(entries).map_err(serde::de::Error::custom)
    }
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::thousand_point()
    }
}

impl GradeTable {
    /// Build a table, rejecting empty tables, non-ascending bounds,
    /// decreasing PDs and PDs outside [0, 1].
    pub fn new(entries: Vec<GradeTableEntry>) -> CreditPdResult<Self> {
        if entries.is_empty() {
            return Err(CreditPdError::InvalidGradeTable(
                "at least one entry required".into(),
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.pd < Decimal::ZERO || entry.pd > Decimal::ONE {
                return Err(CreditPdError::InvalidGradeTable(format!(
                    "grade '{}' has PD {} outside [0, 1]",
                    entry.grade, entry.pd
                )));
            }
            if i == 0 {
                continue;
            }
            let prev = &entries[i - 1];
            if entry.upper_bound <= prev.upper_bound {
                return Err(CreditPdError::InvalidGradeTable(format!(
                    "bound {} for grade '{}' is not above {}",
                    entry.upper_bound, entry.grade, prev.upper_bound
                )));
            }
            if entry.pd < prev.pd {
                return Err(CreditPdError::InvalidGradeTable(format!(
                    "PD for grade '{}' decreases from {} to {}",
                    entry.grade, prev.pd, entry.pd
                )));
            }
        }
        Ok(Self { entries })
    }

    /// TransUnion-style table on the 0-1000 scale.
    pub fn thousand_point() -> Self {
        Self {
            entries: vec![
                GradeTableEntry::new(dec!(0), "A+", dec!(0.0000)),
                GradeTableEntry::new(dec!(371), "A", dec!(0.0013)),
                GradeTableEntry::new(dec!(650), "B", dec!(0.0028)),
                GradeTableEntry::new(dec!(705), "C", dec!(0.0098)),
                GradeTableEntry::new(dec!(760), "D", dec!(0.0117)),
                GradeTableEntry::new(dec!(803), "E", dec!(0.0191)),
                GradeTableEntry::new(dec!(847), "F", dec!(0.0277)),
                GradeTableEntry::new(dec!(890), "G", dec!(0.0531)),
                GradeTableEntry::new(dec!(937), "H", dec!(0.1154)),
                GradeTableEntry::new(dec!(990), "I", dec!(0.9949)),
                GradeTableEntry::new(dec!(1000), "J", dec!(1.0)),
            ],
        }
    }

    /// Same grades on the 0-100 cumulative-population scale, with a final
    /// bankruptcy bucket just above 100.
    pub fn percent_point() -> Self {
        Self {
            entries: vec![
                GradeTableEntry::new(dec!(37.1), "A", dec!(0.0013)),
                GradeTableEntry::new(dec!(65.0), "B", dec!(0.0028)),
                GradeTableEntry::new(dec!(70.5), "C", dec!(0.0098)),
                GradeTableEntry::new(dec!(76.0), "D", dec!(0.0117)),
                GradeTableEntry::new(dec!(80.3), "E", dec!(0.0191)),
                GradeTableEntry::new(dec!(84.7), "F", dec!(0.0277)),
                GradeTableEntry::new(dec!(89.0), "G", dec!(0.0531)),
                GradeTableEntry::new(dec!(93.7), "H", dec!(0.1154)),
                GradeTableEntry::new(dec!(99.0), "I", dec!(0.9946)),
                GradeTableEntry::new(dec!(100.0), "J", dec!(1.0)),
                GradeTableEntry::new(dec!(100.00001), "Bankrupt", dec!(1.0)),
            ],
        }
    }

    pub fn entries(&self) -> &[GradeTableEntry] {
        &self.entries
    }

    /// Top bound of the table; scores above it resolve to the terminal grade.
    pub fn max_bound(&self) -> Score {
        self.terminal().upper_bound
    }

    fn terminal(&self) -> &GradeTableEntry {
        // `new` guarantees at least one entry.
        &self.entries[self.entries.len() - 1]
    }

    /// First entry whose bound is >= `score`, else the terminal entry.
    pub fn lookup(&self, score: Score) -> &GradeTableEntry {
        self.entries
            .iter()
            .find(|e| score <= e.upper_bound)
            .unwrap_or_else(|| self.terminal())
    }

    /// Entry carrying the given letter grade (case-insensitive).
    pub fn by_grade(&self, grade: &str) -> CreditPdResult<&GradeTableEntry> {
        let wanted = grade.trim();
        self.entries
            .iter()
            .find(|e| e.grade.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CreditPdError::UnknownGrade(grade.to_string()))
    }
}

/// Resolve a normalized score to its grade and baseline PD.
pub fn lookup_grade(table: &GradeTable, score: Score) -> GradeLookup {
    GradeLookup::from(table.lookup(score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_boundary_is_inclusive() {
        let table = GradeTable::thousand_point();
        assert_eq!(lookup_grade(&table, dec!(890)).grade, "G");
        assert_eq!(lookup_grade(&table, dec!(890.0001)).grade, "H");
        assert_eq!(lookup_grade(&table, dec!(0)).grade, "A+");
    }

    #[test]
    fn test_interior_scores() {
        let table = GradeTable::thousand_point();
        assert_eq!(lookup_grade(&table, dec!(200)).grade, "A");
        let g = lookup_grade(&table, dec!(720.5));
        assert_eq!(g.grade, "D");
        assert_eq!(g.pd, dec!(0.0117));
        assert_eq!(g.upper_bound, dec!(760));
    }

    #[test]
    fn test_above_max_resolves_to_terminal() {
        let table = GradeTable::thousand_point();
        let g = lookup_grade(&table, dec!(1250));
        assert_eq!(g.grade, "J");
        assert_eq!(g.pd, Decimal::ONE);
        assert_eq!(table.max_bound(), dec!(1000));
    }

    #[test]
    fn test_negative_score_resolves_to_first() {
        let table = GradeTable::thousand_point();
        assert_eq!(lookup_grade(&table, dec!(-5)).grade, "A+");
    }

    #[test]
    fn test_percent_table_bankrupt_bucket() {
        let table = GradeTable::percent_point();
        assert_eq!(lookup_grade(&table, dec!(99)).grade, "I");
        assert_eq!(lookup_grade(&table, dec!(100)).grade, "J");
        assert_eq!(lookup_grade(&table, dec!(100.5)).grade, "Bankrupt");
    }

    #[test]
    fn test_by_grade() {
        let table = GradeTable::thousand_point();
        assert_eq!(table.by_grade("G").unwrap().pd, dec!(0.0531));
        assert_eq!(table.by_grade(" g ").unwrap().grade, "G");
        assert!(matches!(
            table.by_grade("Z"),
            Err(CreditPdError::UnknownGrade(_))
        ));
    }

    #[test]
    fn test_presets_pass_validation() {
        assert!(GradeTable::new(GradeTable::thousand_point().entries().to_vec()).is_ok());
        assert!(GradeTable::new(GradeTable::percent_point().entries().to_vec()).is_ok());
    }

    #[test]
    fn test_rejects_unsorted_bounds() {
        let entries = vec![
            GradeTableEntry::new(dec!(10), "A", dec!(0.01)),
            GradeTableEntry::new(dec!(10), "B", dec!(0.02)),
        ];
        assert!(matches!(
            GradeTable::new(entries),
            Err(CreditPdError::InvalidGradeTable(_))
        ));
    }

    #[test]
    fn test_rejects_decreasing_pd() {
        let entries = vec![
            GradeTableEntry::new(dec!(10), "A", dec!(0.05)),
            GradeTableEntry::new(dec!(20), "B", dec!(0.02)),
        ];
        assert!(GradeTable::new(entries).is_err());
    }

    #[test]
    fn test_rejects_empty_and_out_of_range_pd() {
        assert!(GradeTable::new(vec![]).is_err());
        let entries = vec![GradeTableEntry::new(dec!(10), "A", dec!(1.5))];
        assert!(GradeTable::new(entries).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GradeTable = serde_json::from_str(
            r#"[{"upper_bound":"50","grade":"A","pd":"0.01"},{"upper_bound":"100","grade":"B","pd":"0.2"}]"#,
        )
        .unwrap();
        assert_eq!(ok.entries().len(), 2);

        let bad: Result<GradeTable, _> = serde_json::from_str(
            r#"[{"upper_bound":"100","grade":"A","pd":"0.01"},{"upper_bound":"50","grade":"B","pd":"0.2"}]"#,
        );
        assert!(bad.is_err());
    }
}
