pub mod config;
pub mod display;
pub mod format;
pub mod logger;
pub mod system;
