//! Server vendor/version identification and the capability predicates the
//! rest of the engine consults instead of sprinkling version checks through
//! the introspector and generator.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vendor {
    MySql,
    Percona,
    MariaDb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flavor {
    pub vendor: Vendor,
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

static VERSION_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("static regex is valid"));

impl Flavor {
    pub const fn new(vendor: Vendor, major: u16, minor: u16, patch: u16) -> Self {
        Self {
            vendor,
            major,
            minor,
            patch,
        }
    }

    /// Parses the string returned by `SELECT VERSION()`, e.g.
    /// `8.0.34-0ubuntu0.22.04.1`, `5.5.5-10.6.12-MariaDB-1:10.6.12+maria~ubu2004`,
    /// or `8.0.32-24` (Percona's suffix convention).
    pub fn parse(version_string: &str) -> Option<Self> {
        let lower = version_string.to_ascii_lowercase();
        let vendor = if lower.contains("mariadb") {
            Vendor::MariaDb
        } else if lower.contains("percona") {
            Vendor::Percona
        } else {
            Vendor::MySql
        };

        // MariaDB prefixes the real version with a legacy `5.5.5-` compatibility
        // marker; the genuine version is the *second* `major.minor.patch` run
        // when one is present.
        let mut captures_iter = VERSION_COMMENT_RE.captures_iter(version_string);
        let first = captures_iter.next()?;
        let chosen = if vendor == Vendor::MariaDb {
            captures_iter.next().unwrap_or(first)
        } else {
            first
        };

        let major = chosen.get(1)?.as_str().parse().ok()?;
        let minor = chosen.get(2)?.as_str().parse().ok()?;
        let patch = chosen.get(3)?.as_str().parse().ok()?;

        Some(Self {
            vendor,
            major,
            minor,
            patch,
        })
    }

    /// True if `self >= Flavor::new(vendor, major, minor, patch)` and the
    /// vendor matches exactly. Used to gate quirks and optional syntax that
    /// is vendor-specific (e.g. the Percona compression fix-up).
    #[must_use]
    pub fn min_version(self, vendor: Vendor, major: u16, minor: u16, patch: u16) -> bool {
        self.vendor == vendor && (self.major, self.minor, self.patch) >= (major, minor, patch)
    }

    /// True if `self` is at least as new as the given MySQL version,
    /// regardless of vendor — MariaDB and Percona both track a MySQL
    /// compatibility baseline even though their own version numbers diverge.
    #[must_use]
    pub fn at_least_mysql_compatible(self, major: u16, minor: u16, patch: u16) -> bool {
        match self.vendor {
            Vendor::MySql | Vendor::Percona => (self.major, self.minor, self.patch) >= (major, minor, patch),
            Vendor::MariaDb => true,
        }
    }

    /// MySQL 8.0.19+ and all MariaDB versions omit the display width on
    /// integer types that aren't `TINYINT(1)` (still used as a boolean
    /// convention) when emitting `SHOW CREATE TABLE`.
    #[must_use]
    pub fn omits_int_display_width(self) -> bool {
        match self.vendor {
            Vendor::MySql | Vendor::Percona => self.at_least_mysql_compatible(8, 0, 19),
            Vendor::MariaDb => false,
        }
    }

    /// MySQL 8.0+ moved metadata into a transactional data dictionary, which
    /// changed several `SHOW CREATE` / `information_schema` ordering quirks.
    #[must_use]
    pub fn has_data_dictionary(self) -> bool {
        matches!(self.vendor, Vendor::MySql | Vendor::Percona) && self.at_least_mysql_compatible(8, 0, 0)
    }

    /// Versions without a data dictionary return foreign keys from
    /// `information_schema` in creation order rather than sorted by name;
    /// callers must re-sort to match what `SHOW CREATE TABLE` would emit.
    #[must_use]
    pub fn sorted_foreign_keys(self) -> bool {
        self.has_data_dictionary()
    }

    #[must_use]
    pub fn allows_blob_defaults(self) -> bool {
        self.at_least_mysql_compatible(8, 0, 13) || self.vendor == Vendor::MariaDb
    }

    #[must_use]
    pub fn supports_generated_columns(self) -> bool {
        self.at_least_mysql_compatible(5, 7, 0) || self.vendor == Vendor::MariaDb
    }

    #[must_use]
    pub fn supports_index_expressions(self) -> bool {
        self.at_least_mysql_compatible(8, 0, 13)
    }

    #[must_use]
    pub fn supports_invisible_indexes(self) -> bool {
        self.at_least_mysql_compatible(8, 0, 0) || self.min_version(Vendor::MariaDb, 10, 6, 0)
    }

    #[must_use]
    pub fn supports_check_constraints(self) -> bool {
        self.at_least_mysql_compatible(8, 0, 16) || self.min_version(Vendor::MariaDb, 10, 2, 1)
    }

    #[must_use]
    pub fn supports_page_compression(self) -> bool {
        self.vendor == Vendor::Percona
    }

    /// Percona's `COLUMN_FORMAT COMPRESSED` column-compression attribute was
    /// introduced in 5.6.33-79.0 and is a Percona-only extension.
    #[must_use]
    pub fn supports_column_compression(self) -> bool {
        self.min_version(Vendor::Percona, 5, 6, 33)
    }

    /// MySQL 8.0.13 through 8.0.22 stored blob/text expression defaults in a
    /// way that required re-parsing `SHOW CREATE` to recover the expression
    /// text; 8.0.23 fixed `information_schema.columns` to carry it directly.
    #[must_use]
    pub fn needs_blob_default_fixup(self) -> bool {
        self.vendor != Vendor::MariaDb
            && self.at_least_mysql_compatible(8, 0, 13)
            && !self.at_least_mysql_compatible(8, 0, 23)
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.vendor {
            Vendor::MySql => "mysql",
            Vendor::Percona => "percona",
            Vendor::MariaDb => "mariadb",
        };
        write!(f, "{name}-{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stock_mysql() {
        let flavor = Flavor::parse("8.0.34-0ubuntu0.22.04.1").unwrap();
        assert_eq!(flavor, Flavor::new(Vendor::MySql, 8, 0, 34));
    }

    #[test]
    fn parses_percona() {
        let flavor = Flavor::parse("8.0.32-24").unwrap();
        assert_eq!(flavor.vendor, Vendor::MySql);
        // Percona tags itself via @@version_comment in practice, not @@version;
        // the adapter is responsible for checking that separately. Bare
        // @@version strings from Percona are indistinguishable from stock MySQL.
        assert_eq!((flavor.major, flavor.minor, flavor.patch), (8, 0, 32));
    }

    #[test]
    fn parses_mariadb_compatibility_prefix() {
        let flavor = Flavor::parse("5.5.5-10.6.12-MariaDB-1:10.6.12+maria~ubu2004").unwrap();
        assert_eq!(flavor, Flavor::new(Vendor::MariaDb, 10, 6, 12));
    }

    #[test]
    fn data_dictionary_gates_on_mysql_eight() {
        assert!(Flavor::new(Vendor::MySql, 8, 0, 0).has_data_dictionary());
        assert!(!Flavor::new(Vendor::MySql, 5, 7, 40).has_data_dictionary());
        assert!(!Flavor::new(Vendor::MariaDb, 10, 11, 0).has_data_dictionary());
    }

    #[test]
    fn int_display_width_omission_is_version_gated() {
        assert!(Flavor::new(Vendor::MySql, 8, 0, 19).omits_int_display_width());
        assert!(!Flavor::new(Vendor::MySql, 8, 0, 18).omits_int_display_width());
        assert!(!Flavor::new(Vendor::MariaDb, 10, 11, 0).omits_int_display_width());
    }
}
