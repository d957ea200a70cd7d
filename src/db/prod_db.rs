use std::env;

use crate::db::stack::earnings_archive::EarningsArchive;
use crate::db::stack::orders_archive::OrdersArchive;

pub struct ProdDb {}

impl ProdDb {
    pub fn stack_orders() -> OrdersArchive {
        OrdersArchive {
            duckdb_path: duckdb_path(),
        }
    }

    pub fn stack_earnings() -> EarningsArchive {
        EarningsArchive {
            duckdb_path: duckdb_path(),
        }
    }
}

fn duckdb_path() -> String {
    env::var("STACK_DUCKDB_PATH").unwrap_or_else(|_| "stackcommerce.duckdb".to_string())
}
