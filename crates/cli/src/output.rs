use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tenancy_schema::Timestamp;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Parse optional epoch milliseconds, defaulting to the current time.
pub fn timestamp_or_now(millis: Option<i64>) -> Result<Timestamp> {
    match millis {
        Some(millis) => Ok(Timestamp::from_millis(millis)?),
        None => Ok(Timestamp::now()),
    }
}
