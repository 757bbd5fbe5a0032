pub mod health_records;
pub mod statistics;
