//! Document store: one table per collection, every row keyed by normalised email.

pub mod assessments;
pub mod extractions;
pub mod users;
