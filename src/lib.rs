pub mod api;
pub mod config;
pub mod error;
pub mod lesson;
pub mod llm;
pub mod quiz;
pub mod request;
pub mod telemetry;
pub mod utils;
