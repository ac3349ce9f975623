//! What to export and from which rendered surface

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, ExrCompression, PixelBuffer, Sample};

/// Panorama size tier requested from the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Resolution {
    #[serde(rename = "1k")]
    #[value(name = "1k")]
    OneK,
    #[default]
    #[serde(rename = "2k")]
    #[value(name = "2k")]
    TwoK,
    #[serde(rename = "4k")]
    #[value(name = "4k")]
    FourK,
}

impl Resolution {
    /// Equirectangular (width, height), always 2:1
    pub fn dims(self) -> (u32, u32) {
        match self {
            Resolution::OneK => (1024, 512),
            Resolution::TwoK => (2048, 1024),
            Resolution::FourK => (4096, 2048),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Hdr,
    Exr,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Hdr => "hdr",
            ExportFormat::Exr => "exr",
            ExportFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Write the panorama as rendered
    Equirect,
    /// Reproject onto a `size`² hemisphere disc
    Matcap { size: u32 },
}

/// Pixels handed over by the renderer
#[derive(Debug, Clone)]
pub enum Surface {
    Float(PixelBuffer<f32>),
    Byte(PixelBuffer<u8>),
}

impl Surface {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Surface::Float(buffer) => (buffer.width(), buffer.height()),
            Surface::Byte(buffer) => (buffer.width(), buffer.height()),
        }
    }

    /// Linear float view; 8-bit samples map onto `[0, 1]`
    pub fn to_float(&self) -> Result<PixelBuffer<f32>, CodecError> {
        match self {
            Surface::Float(buffer) => Ok(buffer.clone()),
            Surface::Byte(buffer) => {
                let data = buffer.data().iter().map(|v| v.to_f32() / 255.0).collect();
                PixelBuffer::new(buffer.width(), buffer.height(), buffer.channels(), data)
            }
        }
    }

    /// 8-bit RGBA view; floats are clamped to `[0, 1]` and quantized
    pub fn to_rgba8(&self) -> Result<PixelBuffer<u8>, CodecError> {
        let (width, height) = self.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        match self {
            Surface::Byte(buffer) => {
                for pixel in buffer.data().chunks_exact(buffer.channels()) {
                    data.extend_from_slice(&pixel[..3]);
                    data.push(pixel.get(3).copied().unwrap_or(u8::OPAQUE));
                }
            }
            Surface::Float(buffer) => {
                let quantize = |v: f32| u8::from_f32(v.clamp(0.0, 1.0) * 255.0);
                for pixel in buffer.data().chunks_exact(buffer.channels()) {
                    data.extend(pixel[..3].iter().map(|v| quantize(*v)));
                    data.push(pixel.get(3).map_or(u8::OPAQUE, |a| quantize(*a)));
                }
            }
        }
        PixelBuffer::new(width, height, 4, data)
    }
}

/// One export action
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub compression: ExrCompression,
    pub projection: Projection,
    /// Tier the surface must match; `None` accepts any size
    pub resolution: Option<Resolution>,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub surface: Option<Surface>,
    pub timestamp: DateTime<Local>,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, surface: Option<Surface>) -> Self {
        Self {
            format,
            compression: ExrCompression::default(),
            projection: Projection::Equirect,
            resolution: None,
            prefix: "lumen".into(),
            output_dir: PathBuf::from("."),
            surface,
            timestamp: Local::now(),
        }
    }
}
