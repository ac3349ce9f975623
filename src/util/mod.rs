//! Utility modules

pub mod names;
pub mod paths;

pub use names::export_basename;
pub use paths::{config_path, data_dir, database_path, init_data_dir, log_file_path, logs_dir};
