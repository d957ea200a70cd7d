use std::error::Error;

use duckdb::{Connection, ToSql};
use jiff::civil::Date;
use log::info;

use super::replace_load::{replace_load, LoadTransactionError};

/// Orders table, columns in the portal's CSV export order.  The replace
/// period is rolling: everything with `order_date >= date_from` goes and the
/// fresh rows come in, so re-running a window is idempotent.
pub struct OrdersArchive {
    pub duckdb_path: String,
}

impl OrdersArchive {
    pub fn setup_duckdb(&self) -> Result<(), Box<dyn Error>> {
        info!("initializing StackCommerce orders archive ...");
        let conn = Connection::open(self.duckdb_path.clone())?;
        Self::create_table(&conn)?;
        Ok(())
    }

    pub fn create_table(conn: &Connection) -> Result<(), duckdb::Error> {
        conn.execute_batch(
            r"
    CREATE TABLE IF NOT EXISTS orders (
        order_id BIGINT PRIMARY KEY,
        order_date DATE NOT NULL,
        product_name VARCHAR NOT NULL,
        sku VARCHAR NOT NULL,
        quantity INTEGER NOT NULL,
        sale_price DOUBLE NOT NULL,
        vendor_payout DOUBLE NOT NULL,
        status VARCHAR NOT NULL,
    );",
        )
    }

    /// Replace the rolling window: delete orders dated `date_from` or later,
    /// insert the freshly downloaded rows.  One transaction, all or nothing.
    pub fn replace_period(
        &self,
        conn: &mut Connection,
        date_from: Date,
        rows: &[Vec<String>],
    ) -> Result<(), LoadTransactionError> {
        let from = date_from.strftime("%Y-%m-%d").to_string();
        replace_load(
            conn,
            "orders",
            "DELETE FROM orders WHERE order_date >= ?",
            &[&from as &dyn ToSql],
            rows,
        )
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn order(id: &str, day: &str) -> Vec<String> {
        vec![
            id.to_string(),
            day.to_string(),
            "VPN Lifetime Deal".to_string(),
            "SKU-77".to_string(),
            "1".to_string(),
            "39.99".to_string(),
            "11.99".to_string(),
            "completed".to_string(),
        ]
    }

    fn count(conn: &Connection) -> usize {
        conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn rolling_replace_keeps_older_orders() -> Result<(), Box<dyn Error>> {
        let archive = OrdersArchive {
            duckdb_path: String::new(),
        };
        let mut conn = Connection::open_in_memory()?;
        OrdersArchive::create_table(&conn)?;

        // backfill: an order well before the window and one inside it
        archive.replace_period(
            &mut conn,
            date(2019, 9, 1),
            &[order("900", "2019-09-03"), order("901", "2019-10-20")],
        )?;
        assert_eq!(count(&conn), 2);

        // steady-state run for the trailing window re-delivers 901 and a new
        // order; 900 is out of scope and must survive
        archive.replace_period(
            &mut conn,
            date(2019, 10, 16),
            &[order("901", "2019-10-20"), order("950", "2019-11-14")],
        )?;
        assert_eq!(count(&conn), 3);

        // same run again: idempotent
        archive.replace_period(
            &mut conn,
            date(2019, 10, 16),
            &[order("901", "2019-10-20"), order("950", "2019-11-14")],
        )?;
        assert_eq!(count(&conn), 3);
        Ok(())
    }
}
