mod settings;

pub use settings::{Config, ExportConfig, SyncConfig, EXAMPLE_CONFIG};
