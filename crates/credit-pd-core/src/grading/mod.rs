pub mod table;

pub use table::{lookup_grade, GradeLookup, GradeTable, GradeTableEntry};
