//! C10: replays the rendered DDL against a disposable workspace and checks
//! that the resulting `CREATE TABLE` text byte-matches what the generator
//! produces for the target schema. Catches generator/differ bugs that a
//! type-level review would miss: the only ground truth is what the server
//! itself accepts and reports back.

use crate::adapter::DatabaseAdapter;
use crate::error::{Result, VerificationError};
use crate::flavor::Flavor;
use crate::format::RenderedStatement;
use crate::generator::generate_create_table;
use crate::introspect::introspect_schema;
use crate::schema::Schema;

/// Executes every non-suppressed statement against `adapter`'s current
/// schema (expected to be an empty workspace scoped to this run), then
/// re-introspects it and compares each table's canonical `CREATE TABLE`
/// text against what `expected` would generate.
pub fn verify_schema_diff(
    adapter: &mut dyn DatabaseAdapter,
    statements: &[RenderedStatement],
    expected: &Schema,
    flavor: Flavor,
) -> Result<()> {
    for statement in statements {
        if statement.suppressed {
            continue;
        }
        adapter.execute(&statement.sql)?;
    }

    let actual = introspect_schema(adapter, flavor)?;

    for table in &expected.tables {
        if table.unsupported_for_diff.is_some() {
            continue;
        }
        let expected_create = generate_create_table(table, flavor);
        let actual_create = match actual.table(&table.name) {
            Some(actual_table) => generate_create_table(actual_table, flavor),
            None => String::new(),
        };
        if expected_create != actual_create {
            log::warn!("verification mismatch on table `{}`", table.name);
            return Err(VerificationError {
                table: table.name.clone(),
                expected_create,
                actual_create,
            }
            .into());
        }
    }

    Ok(())
}
