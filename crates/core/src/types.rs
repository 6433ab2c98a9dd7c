//! The MySQL column type model: parsing a raw `information_schema.columns
//! .column_type` string (e.g. `bigint(20) unsigned zerofill`,
//! `decimal(10,5)`, `varchar(30)`) into its structural parts, and the
//! central `modify_column_type_is_unsafe` safety classification.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedType {
    pub raw: String,
    pub base: String,
    pub display_width: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub length: Option<u64>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub values: Vec<String>,
}

static SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z_]+)\s*(?:\(\s*(.*?)\s*\))?\s*(.*)$").expect("static regex is valid"));

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a raw `column_type` string into its structural parts. Unknown or
/// malformed input degrades to a bare `base` with no other fields set
/// rather than failing: the type model only needs to be precise for the
/// families the safety rules care about, and an unrecognized base is always
/// classified `Other`, which is conservatively unsafe to change away from.
#[must_use]
pub fn parse(raw: &str) -> ParsedType {
    let normalized = normalize(raw);
    let Some(captures) = SHAPE_RE.captures(&normalized) else {
        return ParsedType {
            raw: normalized,
            ..Default::default()
        };
    };

    let base = captures.get(1).map_or("", |m| m.as_str()).to_string();
    let paren = captures.get(2).map(|m| m.as_str());
    let flags = captures.get(3).map_or("", |m| m.as_str());
    let unsigned = flags.contains("unsigned");
    let zerofill = flags.contains("zerofill");

    let mut parsed = ParsedType {
        raw: normalized.clone(),
        base: base.clone(),
        unsigned,
        zerofill,
        ..Default::default()
    };

    match base.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
            parsed.display_width = paren.and_then(|p| p.parse().ok());
        }
        "decimal" | "numeric" | "dec" | "fixed" | "float" | "double" | "real" => {
            if let Some(p) = paren {
                let mut parts = p.splitn(2, ',');
                parsed.precision = parts.next().and_then(|s| s.trim().parse().ok());
                parsed.scale = parts.next().and_then(|s| s.trim().parse().ok());
            }
        }
        "char" | "varchar" | "binary" | "varbinary" | "bit" => {
            parsed.length = paren.and_then(|p| p.trim().parse().ok());
        }
        "timestamp" | "datetime" | "time" => {
            parsed.precision = paren.and_then(|p| p.trim().parse().ok());
        }
        "enum" | "set" => {
            parsed.values = paren.map(parse_value_list).unwrap_or_default();
        }
        _ => {}
    }

    parsed
}

static INT_DISPLAY_WIDTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(tinyint|smallint|mediumint|int|integer|bigint)\s*\(\s*(\d+)\s*\)").expect("static regex is valid")
});

/// Strips the `(N)` integer display width MySQL 8.0.19+/MariaDB stopped
/// printing in `SHOW CREATE TABLE`, so the generator's output matches what
/// those flavors would actually emit. `TINYINT(1)` survives untouched: it's
/// the long-standing boolean convention and every flavor keeps printing it.
#[must_use]
pub fn strip_int_display_width(raw: &str) -> String {
    let Some(captures) = INT_DISPLAY_WIDTH_RE.captures(raw) else {
        return raw.to_string();
    };
    if captures[1].eq_ignore_ascii_case("tinyint") && &captures[2] == "1" {
        return raw.to_string();
    }
    INT_DISPLAY_WIDTH_RE.replace(raw, "$1").to_string()
}

/// Splits an `enum`/`set` paren body (`'a','b,c','d''d'`) into its literal
/// values, respecting `''`-escaped quotes inside each quoted element.
fn parse_value_list(body: &str) -> Vec<String> {
    let mut values = Vec::new();
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\'' {
            let mut value = String::new();
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        value.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                value.push(chars[i]);
                i += 1;
            }
            values.push(value);
        } else {
            i += 1;
        }
    }
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Integer,
    DecimalFloat,
    StringBinary,
    EnumSet,
    Temporal,
    Bit,
    Other,
}

fn family(base: &str) -> Family {
    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => Family::Integer,
        "decimal" | "numeric" | "dec" | "fixed" | "float" | "double" | "real" => Family::DecimalFloat,
        "char" | "varchar" | "binary" | "varbinary" | "tinytext" | "text" | "mediumtext" | "longtext"
        | "tinyblob" | "blob" | "mediumblob" | "longblob" => Family::StringBinary,
        "enum" | "set" => Family::EnumSet,
        "timestamp" | "datetime" | "time" => Family::Temporal,
        "bit" => Family::Bit,
        _ => Family::Other,
    }
}

fn integer_bytes(base: &str) -> u32 {
    match base {
        "tinyint" => 1,
        "smallint" => 2,
        "mediumint" => 3,
        "int" | "integer" => 4,
        "bigint" => 8,
        _ => 0,
    }
}

fn integer_range(bytes: u32, unsigned: bool) -> (i128, i128) {
    if bytes == 0 {
        return (0, 0);
    }
    if unsigned {
        (0, (1i128 << (8 * bytes)) - 1)
    } else {
        let max = (1i128 << (8 * bytes - 1)) - 1;
        (-(max + 1), max)
    }
}

fn is_binary_string_family(base: &str) -> bool {
    matches!(
        base,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob"
    )
}

fn is_text_string_family(base: &str) -> bool {
    matches!(
        base,
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext"
    )
}

/// Inclusive maximum byte length for the string/binary families. `char` and
/// `varchar` report their declared length directly (charset expansion is a
/// column-level concern handled separately); the `*text`/`*blob` family
/// members have fixed caps regardless of any declared length.
fn string_max_bytes(parsed: &ParsedType) -> Option<u64> {
    match parsed.base.as_str() {
        "char" | "varchar" | "binary" | "varbinary" => parsed.length.or(Some(0)),
        "tinytext" | "tinyblob" => Some(255),
        "text" | "blob" => Some(65_535),
        "mediumtext" | "mediumblob" => Some(16_777_215),
        "longtext" | "longblob" => Some(4_294_967_295),
        _ => None,
    }
}

/// Classifies a column type change as safe or unsafe purely from the two
/// `column_type` strings (charset/collation and generated-column checks
/// need column-level context and live in [`crate::schema::Table`]'s differ
/// instead).
#[must_use]
pub fn modify_column_type_is_unsafe(old_raw: &str, new_raw: &str) -> bool {
    let old_norm = normalize(old_raw);
    let new_norm = normalize(new_raw);
    if old_norm == new_norm {
        return false; // rule 1
    }

    let old = parse(&old_norm);
    let new = parse(&new_norm);
    let old_family = family(&old.base);
    let new_family = family(&new.base);

    match (old_family, new_family) {
        (Family::Integer, Family::Integer) => {
            let old_range = integer_range(integer_bytes(&old.base), old.unsigned);
            let new_range = integer_range(integer_bytes(&new.base), new.unsigned);
            !(old_range.0 >= new_range.0 && old_range.1 <= new_range.1)
        }
        (Family::DecimalFloat, Family::DecimalFloat) => decimal_float_is_unsafe(&old, &new),
        (Family::StringBinary, Family::StringBinary) => string_binary_is_unsafe(&old, &new),
        (Family::EnumSet, Family::EnumSet) => {
            old.base != new.base || !is_enum_set_prefix(&old.values, &new.values)
        }
        (Family::Temporal, Family::Temporal) => old.base != new.base || new.precision.unwrap_or(0) < old.precision.unwrap_or(0),
        (Family::Bit, Family::Bit) => new.length.unwrap_or(1) < old.length.unwrap_or(1),
        _ => true,
    }
}

fn decimal_float_is_unsafe(old: &ParsedType, new: &ParsedType) -> bool {
    if old.base != new.base {
        return true; // crossing families, including double -> float, is unsafe
    }
    let precision_reduced = new.precision.unwrap_or(0) < old.precision.unwrap_or(0);
    let scale_reduced = new.scale.unwrap_or(0) < old.scale.unwrap_or(0);
    precision_reduced || scale_reduced
}

fn string_binary_is_unsafe(old: &ParsedType, new: &ParsedType) -> bool {
    if is_binary_string_family(&old.base) != is_binary_string_family(&new.base) {
        return true;
    }
    let old_max = string_max_bytes(old).unwrap_or(0);
    let new_max = string_max_bytes(new).unwrap_or(0);
    new_max < old_max
}

/// ENUM: safe only to append new values at the end. SET: appending anywhere
/// that does not renumber an existing bit is safe, which in practice also
/// means append-at-the-end only, since SET bit positions are assigned by
/// declaration order. Both reduce to "old is an order-preserving prefix of
/// new".
fn is_enum_set_prefix(old: &[String], new: &[String]) -> bool {
    old.len() <= new.len() && old.iter().zip(new.iter()).all(|(a, b)| a == b)
}

/// Rule 2: a charset change on a text column is unsafe; a collation change
/// within the same charset is safe. `is_text` excludes binary-family
/// columns, which carry no charset at all.
#[must_use]
pub fn charset_change_is_unsafe(old_charset: Option<&str>, new_charset: Option<&str>, is_text: bool) -> bool {
    is_text && old_charset != new_charset
}
