//! Shareable URL state
//!
//! Encodes the UI mode, lights and cameras into URL-safe query parameters so
//! a scene can be reopened from a link alone.

mod address_bar;
mod codec;
mod params;

pub use address_bar::{AddressBar, MemoryAddressBar, StoreAddressBar};
pub use codec::{decode_token, encode_token};
pub use params::{ShareState, CAMERAS_PARAM, LIGHTS_PARAM, MODE_PARAM};
