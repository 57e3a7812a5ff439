pub mod attempt;
pub mod connection;
