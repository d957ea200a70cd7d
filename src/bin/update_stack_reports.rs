use std::{error::Error, thread, time::Duration};

use duckdb::Connection;
use jiff::Zoned;
use log::{info, warn};
use stackpull::db::prod_db::ProdDb;
use stackpull::db::stack::replace_load::parse_report;
use stackpull::periods::PipelineWindows;
use stackpull::portal::session::{LoginOutcome, PortalConfig, PortalSession};

/// Politeness delay between consecutive portal calls.  Not a retry.
const REQUEST_DELAY: Duration = Duration::from_secs(2);

/// Run this job once a day.  One full pass: login, fetch the order batches
/// for the trailing 30 days, download the orders and the month-to-date
/// earnings, replace-load both, sign out.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    let _ = dotenvy::dotenv();

    let config = PortalConfig::from_env()?;
    let windows = PipelineWindows::for_today(Zoned::now().date());

    let mut session = PortalSession::connect(config)?;
    match session.login()? {
        LoginOutcome::Success => {}
        LoginOutcome::Rejected(message) => {
            warn!("Login rejected, aborting the run.");
            return Err(Box::from(format!("login rejected: {}", message)));
        }
    }

    thread::sleep(REQUEST_DELAY);
    let batches = session.order_batches(windows.orders_from, windows.to)?;
    thread::sleep(REQUEST_DELAY);
    let orders_body = session.download_orders(&batches)?;
    thread::sleep(REQUEST_DELAY);
    let earnings_body = session.download_earnings(windows.earnings_from, windows.to)?;

    info!("Prepare orders data to upload.");
    let orders = ProdDb::stack_orders();
    orders.setup_duckdb()?;
    let mut conn = Connection::open(&orders.duckdb_path)?;
    orders.replace_period(&mut conn, windows.orders_from, &parse_report(&orders_body))?;

    info!("Prepare earnings data to upload.");
    let earnings = ProdDb::stack_earnings();
    earnings.setup_duckdb()?;
    let mut conn = Connection::open(&earnings.duckdb_path)?;
    earnings.replace_period(
        &mut conn,
        windows.earnings_from.year(),
        windows.earnings_from.month(),
        &parse_report(&earnings_body),
    )?;

    Ok(())
}
