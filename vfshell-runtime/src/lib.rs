pub mod config_store;
pub mod export;

pub use config_store::ConfigStore;
pub use export::CliExporter;
