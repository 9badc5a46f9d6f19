pub mod fake;
pub mod gateway;
