use schemasync_core::{Flavor, Vendor};
use schemasync_testkit::{load_test_cases_from_str, run_diff_test, TestResult};

const MANIFEST: &str = include_str!("fixtures/column_safety.yaml");

#[test]
fn all_column_safety_fixtures_pass_on_mysql_eight() {
    let cases = load_test_cases_from_str(MANIFEST).expect("fixture manifest parses");
    assert!(!cases.is_empty(), "fixture manifest should not be empty");

    let flavor = Flavor::new(Vendor::MySql, 8, 0, 34);
    for (name, case) in &cases {
        match run_diff_test(case, flavor) {
            TestResult::Passed | TestResult::Skipped(_) => {}
            TestResult::Failed(message) => panic!("fixture `{name}` failed: {message}"),
        }
    }
}

#[test]
fn mariadb_only_fixture_is_skipped_on_mysql() {
    let cases = load_test_cases_from_str(MANIFEST).expect("fixture manifest parses");
    let case = &cases["mariadb_only_fixture_is_skipped_on_mysql"];
    let flavor = Flavor::new(Vendor::MySql, 8, 0, 34);
    assert!(matches!(run_diff_test(case, flavor), TestResult::Skipped(_)));
}

#[test]
fn mariadb_only_fixture_runs_on_mariadb() {
    let cases = load_test_cases_from_str(MANIFEST).expect("fixture manifest parses");
    let case = &cases["mariadb_only_fixture_is_skipped_on_mysql"];
    let flavor = Flavor::new(Vendor::MariaDb, 10, 11, 0);
    assert_eq!(run_diff_test(case, flavor), TestResult::Passed);
}
