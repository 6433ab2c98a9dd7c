//! C7/C8: the diff engine. [`table`] compares one table at a time into
//! [`clause::AlterClause`]s; [`schema`] composes per-table/per-routine
//! diffs into a whole-schema [`schema::SchemaDiff`]. [`ordering`] holds the
//! column-reordering math both of them lean on.

pub mod clause;
pub mod ordering;
pub mod schema;
pub mod table;
