use std::{error::Error, thread, time::Duration};

use duckdb::Connection;
use log::info;
use stackpull::db::prod_db::ProdDb;
use stackpull::db::stack::replace_load::parse_report;
use stackpull::periods::calendar_months;
use stackpull::portal::session::{LoginOutcome, PortalConfig, PortalSession};

const REQUEST_DELAY: Duration = Duration::from_secs(2);

/// One-time historical backfill, month by month from 2019-01-01 through the
/// end of 2019.  Each month stays within the server's ~30 day batches
/// window, so no pagination is needed.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    let _ = dotenvy::dotenv();

    let config = PortalConfig::from_env()?;
    let start = "2019-01-01".parse()?;

    let orders = ProdDb::stack_orders();
    orders.setup_duckdb()?;
    let earnings = ProdDb::stack_earnings();
    earnings.setup_duckdb()?;

    let mut session = PortalSession::connect(config)?;
    match session.login()? {
        LoginOutcome::Success => {}
        LoginOutcome::Rejected(message) => {
            return Err(Box::from(format!("login rejected: {}", message)));
        }
    }

    for (first_day, last_day) in calendar_months(start, 2020) {
        info!("Backfilling {} - {}", first_day, last_day);

        thread::sleep(REQUEST_DELAY);
        let batches = session.order_batches(first_day, last_day)?;
        thread::sleep(REQUEST_DELAY);
        let orders_body = session.download_orders(&batches)?;
        thread::sleep(REQUEST_DELAY);
        let earnings_body = session.download_earnings(first_day, last_day)?;

        let mut conn = Connection::open(&orders.duckdb_path)?;
        orders.replace_period(&mut conn, first_day, &parse_report(&orders_body))?;

        let mut conn = Connection::open(&earnings.duckdb_path)?;
        earnings.replace_period(
            &mut conn,
            first_day.year(),
            first_day.month(),
            &parse_report(&earnings_body),
        )?;
    }

    Ok(())
}
