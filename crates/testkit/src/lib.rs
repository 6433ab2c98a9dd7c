//! YAML-fixture test harness for `schemasync-core`'s diff engine: each
//! fixture declares an old/new table shape and the alter clauses (and
//! safety classification) diffing between them should produce.

mod yaml_runner;

pub use yaml_runner::{load_test_cases_from_str, matches_flavor, run_diff_test, ColumnFixture, TableFixture, TestCase, TestResult};
