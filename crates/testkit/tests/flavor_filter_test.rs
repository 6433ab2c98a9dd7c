use schemasync_testkit::matches_flavor;

#[test]
fn no_requirement_matches_everything() {
    assert!(matches_flavor(None, "mysql-8.0.34"));
    assert!(matches_flavor(Some(""), "mysql-8.0.34"));
}

#[test]
fn prefix_requirement_matches_by_prefix() {
    assert!(matches_flavor(Some("mysql"), "mysql-8.0.34"));
    assert!(matches_flavor(Some("mysql-8.0"), "mysql-8.0.34"));
    assert!(!matches_flavor(Some("mysql-8.1"), "mysql-8.0.34"));
    assert!(!matches_flavor(Some("mariadb"), "mysql-8.0.34"));
}

#[test]
fn negated_requirement_excludes_a_flavor() {
    assert!(matches_flavor(Some("!mariadb"), "mysql-8.0.34"));
    assert!(!matches_flavor(Some("!mysql"), "mysql-8.0.34"));
}
