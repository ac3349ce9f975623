pub mod codec;
pub mod config;
pub mod core;
pub mod data;
pub mod export;
pub mod history;
pub mod scene;
pub mod share;
pub mod sync;
pub mod util;

pub use codec::{encode_exr, encode_hdr, resample_hemisphere, ExrCompression, PixelBuffer};
pub use config::Config;
pub use core::{Studio, StudioHandle, StudioOptions};
pub use data::{open_store, DurableStore, MemoryStore, SqliteStore};
pub use export::{
    ExportError, ExportFormat, ExportRequest, Exporter, Notification, Projection, Resolution,
    Surface,
};
pub use history::{HistoryEngine, PersistedHistory, HISTORY_LIMIT};
pub use scene::{Camera, Light, LightKind, SceneState, Snapshot};
pub use share::{AddressBar, MemoryAddressBar, ShareState, StoreAddressBar};
pub use sync::DebouncedSync;
