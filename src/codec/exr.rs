//! Single-part scanline OpenEXR encoder
//!
//! Output is always four HALF channels stored alphabetically (A, B, G, R),
//! with alpha forced to 1.0. Blocks are either uncompressed (one scanline
//! each) or ZIP compressed (sixteen scanlines each).

use std::io::Write;

use half::f16;
use libflate::zlib;
use serde::{Deserialize, Serialize};

use super::pixels::{PixelBuffer, Sample};
use super::CodecError;

const MAGIC: u32 = 20000630;
/// Version 2, single-part scanline file
const VERSION: u32 = 2;
/// Channels in the order they are stored
const CHANNELS: [&str; 4] = ["A", "B", "G", "R"];
const PIXEL_TYPE_HALF: i32 = 1;
const HALF_MAX: f32 = 65504.0;

/// Block compression of an OpenEXR file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExrCompression {
    None,
    #[default]
    Zip,
}

impl ExrCompression {
    /// Value of the `compression` header attribute
    fn code(self) -> u8 {
        match self {
            ExrCompression::None => 0,
            ExrCompression::Zip => 3,
        }
    }

    pub fn lines_per_block(self) -> u32 {
        match self {
            ExrCompression::None => 1,
            ExrCompression::Zip => 16,
        }
    }
}

/// Convert to half precision by truncating the mantissa.
///
/// Magnitudes beyond the half range clamp to ±65504 and NaN stays NaN.
pub fn f32_to_half(value: f32) -> f16 {
    if value.is_nan() {
        return f16::from_bits(0x7e00);
    }
    let bits = value.clamp(-HALF_MAX, HALF_MAX).to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    let half_exponent = exponent - 112;
    if half_exponent <= 0 {
        if half_exponent < -10 {
            return f16::from_bits(sign);
        }
        let shifted = (mantissa | 0x0080_0000) >> (14 - half_exponent);
        return f16::from_bits(sign | shifted as u16);
    }
    f16::from_bits(sign | ((half_exponent as u16) << 10) | (mantissa >> 13) as u16)
}

struct HeaderWriter {
    out: Vec<u8>,
}

impl HeaderWriter {
    fn attribute(&mut self, name: &str, kind: &str, value: &[u8]) {
        self.out.extend_from_slice(name.as_bytes());
        self.out.push(0);
        self.out.extend_from_slice(kind.as_bytes());
        self.out.push(0);
        self.out.extend_from_slice(&(value.len() as i32).to_le_bytes());
        self.out.extend_from_slice(value);
    }
}

fn box2i(width: u32, height: u32) -> Vec<u8> {
    [0i32, 0, width as i32 - 1, height as i32 - 1]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

fn channel_list() -> Vec<u8> {
    let mut list = Vec::new();
    for name in CHANNELS {
        list.extend_from_slice(name.as_bytes());
        list.push(0);
        list.extend_from_slice(&PIXEL_TYPE_HALF.to_le_bytes());
        // pLinear + reserved
        list.extend_from_slice(&[0, 0, 0, 0]);
        list.extend_from_slice(&1i32.to_le_bytes());
        list.extend_from_slice(&1i32.to_le_bytes());
    }
    list.push(0);
    list
}

fn header(width: u32, height: u32, compression: ExrCompression) -> Vec<u8> {
    let mut writer = HeaderWriter { out: Vec::new() };
    writer.out.extend_from_slice(&MAGIC.to_le_bytes());
    writer.out.extend_from_slice(&VERSION.to_le_bytes());

    let window = box2i(width, height);
    writer.attribute("compression", "compression", &[compression.code()]);
    writer.attribute("screenWindowCenter", "v2f", &[0; 8]);
    writer.attribute("screenWindowWidth", "float", &1.0f32.to_le_bytes());
    writer.attribute("pixelAspectRatio", "float", &1.0f32.to_le_bytes());
    writer.attribute("lineOrder", "lineOrder", &[0]);
    writer.attribute("dataWindow", "box2i", &window);
    writer.attribute("displayWindow", "box2i", &window);
    writer.attribute("channels", "chlist", &channel_list());
    writer.out.push(0);
    writer.out
}

/// Raw bytes of scanlines `[first, last)`: per line, each channel's halves
fn block_bytes<T: Sample>(image: &PixelBuffer<T>, first: u32, last: u32) -> Vec<u8> {
    let width = image.width();
    let one = f16::ONE.to_le_bytes();
    let mut out = Vec::with_capacity((last - first) as usize * width as usize * 8);

    for y in first..last {
        // A
        for _ in 0..width {
            out.extend_from_slice(&one);
        }
        // B, G, R
        for channel in [2, 1, 0] {
            for x in 0..width {
                let value = image.rgb(x, y)[channel];
                out.extend_from_slice(&f32_to_half(value).to_le_bytes());
            }
        }
    }
    out
}

/// Byte reorder and delta predictor applied before deflate
fn predict(raw: &[u8]) -> Vec<u8> {
    let mut split = Vec::with_capacity(raw.len());
    split.extend(raw.iter().step_by(2));
    split.extend(raw.iter().skip(1).step_by(2));

    let mut prev = match split.first() {
        Some(first) => *first,
        None => return split,
    };
    for byte in split.iter_mut().skip(1) {
        let current = *byte;
        *byte = current.wrapping_sub(prev).wrapping_add(128);
        prev = current;
    }
    split
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let compress = || -> std::io::Result<Vec<u8>> {
        let mut encoder = zlib::Encoder::new(Vec::new())?;
        encoder.write_all(data)?;
        encoder.finish().into_result()
    };
    compress().map_err(|e| CodecError::Compress(e.to_string()))
}

/// Encode an RGB(A) buffer as an OpenEXR file
pub fn encode_exr<T: Sample>(
    image: &PixelBuffer<T>,
    compression: ExrCompression,
) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (image.width(), image.height());
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(CodecError::Dimensions { width, height });
    }

    let lines = compression.lines_per_block();
    let block_count = height.div_ceil(lines) as usize;

    let mut blocks = Vec::with_capacity(block_count);
    for first in (0..height).step_by(lines as usize) {
        let last = (first + lines).min(height);
        let raw = block_bytes(image, first, last);
        let data = match compression {
            ExrCompression::None => raw,
            ExrCompression::Zip => {
                let packed = deflate(&predict(&raw))?;
                // Readers treat a block of exactly the raw size as stored
                if packed.len() < raw.len() {
                    packed
                } else {
                    raw
                }
            }
        };
        blocks.push((first, data));
    }

    let mut out = header(width, height, compression);
    let table_start = out.len();
    let mut offset = (table_start + block_count * 8) as u64;
    for (_, data) in &blocks {
        out.extend_from_slice(&offset.to_le_bytes());
        offset += 8 + data.len() as u64;
    }
    for (first, data) in blocks {
        out.extend_from_slice(&(first as i32).to_le_bytes());
        out.extend_from_slice(&(data.len() as i32).to_le_bytes());
        out.extend_from_slice(&data);
    }

    Ok(out)
}
