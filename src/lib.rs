pub mod analysis;
pub mod cleaning;
pub mod config;
pub mod importers;
pub mod store;
pub mod table;
