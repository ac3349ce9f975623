//! Pixel codecs: hemisphere resampling and the HDR file encoders

mod exr;
mod pixels;
mod resample;
mod rgbe;

pub use exr::{encode_exr, f32_to_half, ExrCompression};
pub use pixels::{CodecError, PixelBuffer, Sample};
pub use resample::{disc_coords, disc_to_uv, resample_hemisphere};
pub use rgbe::{encode_hdr, rgb_to_rgbe, rle_encode};
