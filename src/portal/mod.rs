pub mod scrape;
pub mod session;
