pub mod api;
pub mod cmd;
pub mod config;
pub mod errors;
pub mod generator;
pub mod log;
pub mod templates;
pub mod writer;
