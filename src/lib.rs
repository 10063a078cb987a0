pub mod analyzers;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod loader;
pub mod maps;
pub mod output;
pub mod server;
