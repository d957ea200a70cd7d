pub mod earnings_archive;
pub mod orders_archive;
pub mod replace_load;
