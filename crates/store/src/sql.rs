//! Run sea-query built statements on a rusqlite connection.

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params_from_iter};
use tenancy_schema::db::Built;

/// Convert `sea_query::Values` into rusqlite bind params.
pub fn bind_values(values: &sea_query::Values) -> Vec<SqlValue> {
    values.0.iter().map(to_sql_value).collect()
}

fn to_sql_value(value: &sea_query::Value) -> SqlValue {
    use sea_query::Value;
    match value {
        Value::Bool(Some(b)) => SqlValue::Integer(i64::from(*b)),
        Value::TinyInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::SmallInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::Int(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::BigInt(Some(i)) => SqlValue::Integer(*i),
        Value::TinyUnsigned(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::SmallUnsigned(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::Unsigned(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Value::BigUnsigned(Some(i)) => SqlValue::Integer(i64::try_from(*i).unwrap_or(i64::MAX)),
        Value::Float(Some(f)) => SqlValue::Real(f64::from(*f)),
        Value::Double(Some(f)) => SqlValue::Real(*f),
        Value::String(Some(s)) => SqlValue::Text(s.as_str().to_owned()),
        Value::Char(Some(c)) => SqlValue::Text(c.to_string()),
        Value::Bytes(Some(b)) => SqlValue::Blob(b.to_vec()),
        _ => SqlValue::Null,
    }
}

pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, params_from_iter(bind_values(&values)))
}

pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, params_from_iter(bind_values(&values)), f)
}

pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values(&values)), f)?;
    rows.collect()
}
