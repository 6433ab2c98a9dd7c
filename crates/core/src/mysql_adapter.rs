//! The one place in the crate that touches the `mysql` crate directly.
//! Everything else talks to [`crate::adapter::DatabaseAdapter`].

use std::sync::Mutex;

use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Pool, PooledConn, Row, Value};

use crate::adapter::{DatabaseAdapter, SqlRow, SqlValue};
use crate::config::ConnectionConfig;
use crate::error::{ConnectError, Error, IntrospectionError, Result};

pub struct MysqlAdapter {
    connection: Mutex<PooledConn>,
    default_schema: String,
    host: String,
}

impl MysqlAdapter {
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));
        if let Some(socket) = &config.socket {
            opts = opts.socket(Some(socket.clone()));
        }

        let pool = Pool::new(opts).map_err(|e| {
            Error::from(ConnectError {
                host: config.host.clone(),
                message: e.to_string(),
            })
        })?;
        let connection = pool.get_conn().map_err(|e| {
            Error::from(ConnectError {
                host: config.host.clone(),
                message: e.to_string(),
            })
        })?;

        Ok(Self {
            connection: Mutex::new(connection),
            default_schema: config.database.clone(),
            host: config.host.clone(),
        })
    }
}

fn convert_value(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => SqlValue::Bytes(bytes),
        Value::Int(n) => SqlValue::Int(n),
        Value::UInt(n) => SqlValue::UInt(n),
        Value::Float(f) => SqlValue::Float(f64::from(f)),
        Value::Double(f) => SqlValue::Float(f),
        Value::Date(year, month, day, hour, minute, second, micros) => SqlValue::Bytes(
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}").into_bytes(),
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            SqlValue::Bytes(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}").into_bytes())
        }
    }
}

fn convert_row(row: Row) -> SqlRow {
    let columns = row.columns();
    // Lower-cased defensively: every query aliases its columns in lower
    // case already, but `SqlRow::get` also matches case-insensitively so a
    // driver/collation that changes the wire case still resolves.
    let names: Vec<String> = columns.iter().map(|c| c.name_str().to_ascii_lowercase()).collect();
    let values = row.unwrap();
    SqlRow::new(
        names
            .into_iter()
            .zip(values.into_iter().map(convert_value))
            .collect(),
    )
}

impl DatabaseAdapter for MysqlAdapter {
    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>> {
        let mut conn = self.connection.lock().expect("mysql connection mutex poisoned");
        let rows: Vec<Row> = conn.query(sql).map_err(|e| {
            Error::from(IntrospectionError {
                schema: self.default_schema.clone(),
                table: None,
                message: e.to_string(),
            })
        })?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let mut conn = self.connection.lock().expect("mysql connection mutex poisoned");
        conn.query_drop(sql).map_err(|e| {
            Error::from(IntrospectionError {
                schema: self.default_schema.clone(),
                table: None,
                message: e.to_string(),
            })
        })?;
        Ok(())
    }

    fn server_version_comment(&mut self) -> Result<(String, String)> {
        let version = self
            .query("SELECT @@version AS v, @@version_comment AS c")?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::from(IntrospectionError {
                    schema: self.default_schema.clone(),
                    table: None,
                    message: "@@version query returned no rows".to_string(),
                })
            })?;
        Ok((version.get_string("v"), version.get_string("c")))
    }

    fn current_schema(&self) -> &str {
        &self.default_schema
    }

    fn host(&self) -> &str {
        &self.host
    }
}
