//! Editor session orchestration.
//!
//! [`Studio`] ties the history engine to durable storage and the shared link;
//! [`StudioHandle`] drives it from a background task so debounce timers fire
//! on their own.

mod handle;
mod studio;

pub use handle::{join, StudioCommand, StudioHandle};
pub use studio::{Studio, StudioOptions};
