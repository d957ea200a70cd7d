use std::error::Error;

use duckdb::{Connection, ToSql};
use log::info;

use super::replace_load::{replace_load, LoadTransactionError};

/// Earnings table: `(report_year, report_month)` from the query period,
/// then the portal's CSV export columns.  Each calendar month is a replace
/// unit.
pub struct EarningsArchive {
    pub duckdb_path: String,
}

impl EarningsArchive {
    pub fn setup_duckdb(&self) -> Result<(), Box<dyn Error>> {
        info!("initializing StackCommerce earnings archive ...");
        let conn = Connection::open(self.duckdb_path.clone())?;
        Self::create_table(&conn)?;
        Ok(())
    }

    pub fn create_table(conn: &Connection) -> Result<(), duckdb::Error> {
        conn.execute_batch(
            r"
    CREATE TABLE IF NOT EXISTS earnings (
        report_year SMALLINT NOT NULL,
        report_month TINYINT NOT NULL,
        product_name VARCHAR NOT NULL,
        sku VARCHAR NOT NULL,
        units_sold INTEGER NOT NULL,
        gross_revenue DOUBLE NOT NULL,
        earnings DOUBLE NOT NULL,
        PRIMARY KEY (report_year, report_month, sku)
    );",
        )
    }

    /// Prefix each parsed row with the query period.  The year and month
    /// come from the period the report was requested for, not from the row
    /// content.
    pub fn prefix_rows(year: i16, month: i8, rows: &[Vec<String>]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| {
                let mut prefixed = Vec::with_capacity(row.len() + 2);
                prefixed.push(year.to_string());
                prefixed.push(month.to_string());
                prefixed.extend(row.iter().cloned());
                prefixed
            })
            .collect()
    }

    /// Replace one calendar month: delete the `(year, month)` slice, insert
    /// the freshly downloaded rows prefixed with the period.
    pub fn replace_period(
        &self,
        conn: &mut Connection,
        year: i16,
        month: i8,
        rows: &[Vec<String>],
    ) -> Result<(), LoadTransactionError> {
        let prefixed = Self::prefix_rows(year, month, rows);
        replace_load(
            conn,
            "earnings",
            "DELETE FROM earnings WHERE report_year = ? AND report_month = ?",
            &[&(year as i32) as &dyn ToSql, &(month as i32)],
            &prefixed,
        )
    }
}
