//! Transactional replace-load: delete everything for a period key, insert
//! the freshly fetched rows, commit.  All or nothing: a failed delete or
//! insert rolls the whole transaction back.

use duckdb::{params_from_iter, Connection, ToSql};
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("replace-load transaction failed: {0}")]
pub struct LoadTransactionError(#[from] duckdb::Error);

/// Parse a CSV report body into row tuples.  The first row is a header and
/// is discarded; the rest keep the input column order, values as text.  A
/// body that is not CSV at all yields no usable rows.
pub fn parse_report(body: &str) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(body.as_bytes());
    rdr.records()
        .filter_map(|r| r.ok())
        .map(|record| record.iter().map(|field| field.to_string()).collect())
        .collect()
}

/// Within one transaction: delete the rows matching the caller's period-key
/// predicate, then insert-or-ignore each row tuple.  Rows whose primary key
/// already exists (duplicate order ids across overlapping windows) are
/// silently skipped.  Any failure rolls back and propagates.
pub fn replace_load(
    conn: &mut Connection,
    table: &str,
    delete_sql: &str,
    delete_params: &[&dyn ToSql],
    rows: &[Vec<String>],
) -> Result<(), LoadTransactionError> {
    let tx = conn.transaction()?;

    let deleted = tx.execute(delete_sql, delete_params)?;
    info!("{} rows have been deleted from {}", deleted, table);

    let mut inserted = 0;
    if let Some(first) = rows.first() {
        let placeholders = vec!["?"; first.len()].join(", ");
        let sql = format!("INSERT OR IGNORE INTO {} VALUES ({})", table, placeholders);
        let mut stmt = tx.prepare(&sql)?;
        for row in rows {
            inserted += stmt.execute(params_from_iter(row.iter()))?;
        }
    }
    info!("{} rows have been added to {}", inserted, table);

    tx.commit()?;
    Ok(())
}
