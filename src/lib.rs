pub mod db;
pub mod periods;
pub mod portal;
