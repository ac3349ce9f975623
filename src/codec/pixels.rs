//! Interleaved pixel buffers shared by the resampler and the encoders

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported channel count {0} (expected 3 or 4)")]
    Channels(usize),
    #[error("Buffer holds {actual} samples but {width}x{height}x{channels} needs {expected}")]
    Length {
        width: u32,
        height: u32,
        channels: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Image dimensions {width}x{height} are not supported")]
    Dimensions { width: u32, height: u32 },
    #[error("Block compression failed: {0}")]
    Compress(String),
}

/// A sample type the resampler can interpolate
pub trait Sample: Copy + Default + Send + Sync + 'static {
    /// Value used for a fully opaque alpha channel
    const OPAQUE: Self;

    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;
}

impl Sample for u8 {
    const OPAQUE: Self = u8::MAX;

    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    fn from_f32(value: f32) -> Self {
        value.round().clamp(0.0, 255.0) as u8
    }
}

impl Sample for f32 {
    const OPAQUE: Self = 1.0;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(value: f32) -> Self {
        value
    }
}

/// Row-major interleaved image with 3 (RGB) or 4 (RGBA) samples per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<T>,
}

impl<T: Sample> PixelBuffer<T> {
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<T>) -> Result<Self, CodecError> {
        if channels != 3 && channels != 4 {
            return Err(CodecError::Channels(channels));
        }
        if width == 0 || height == 0 {
            return Err(CodecError::Dimensions { width, height });
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(CodecError::Length {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Buffer filled with one RGBA colour
    pub fn filled(width: u32, height: u32, rgba: [T; 4]) -> Result<Self, CodecError> {
        let count = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::new(width, height, 4, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Samples of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        &self.data[start..start + self.channels]
    }

    /// RGB of the pixel at (x, y) as floats, ignoring alpha
    pub fn rgb(&self, x: u32, y: u32) -> [f32; 3] {
        let p = self.pixel(x, y);
        [p[0].to_f32(), p[1].to_f32(), p[2].to_f32()]
    }
}
