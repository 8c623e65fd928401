pub mod config;
pub mod models;
pub mod processing;
pub mod scanner;
pub mod utils;
pub mod validation;

pub use config::ScannerConfig;
pub use scanner::DocumentScanner;
