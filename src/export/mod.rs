//! Export pipeline: rendered surface → projection → encoder → files on disk

mod notify;
mod request;
mod writer;

pub use notify::{Notification, NotificationLevel};
pub use request::{ExportFormat, ExportRequest, Projection, Resolution, Surface};
pub use writer::{ExportError, ExportOutcome, Exporter};
