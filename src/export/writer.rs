//! Encodes a rendered surface and writes it next to its settings file

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::notify::Notification;
use super::request::{ExportFormat, ExportRequest, Projection, Surface};
use crate::codec::{encode_exr, encode_hdr, resample_hemisphere, CodecError, PixelBuffer};
use crate::scene::{export_settings, Snapshot};
use crate::util::export_basename;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: no rendered image is available")]
    MissingSurface,
    #[error("Rendered image is {actual:?} but the export needs {expected:?}")]
    SurfaceSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Cannot encode image: {0}")]
    Codec(#[from] CodecError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Problems the user can act on are shown as-is; anything else gets a
    /// generic message and the details go to the log.
    pub fn notification(&self) -> Notification {
        match self {
            ExportError::MissingSurface
            | ExportError::SurfaceSize { .. }
            | ExportError::Codec(_) => Notification::error(self.to_string()),
            ExportError::Image(_) | ExportError::Io(_) | ExportError::Json(_) => {
                Notification::error("Export failed. See the log for details.")
            }
        }
    }
}

/// Files produced by one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub image_path: PathBuf,
    pub settings_path: PathBuf,
    pub bytes_written: usize,
}

impl ExportOutcome {
    /// Status-line message for a finished export
    pub fn notification(&self) -> Notification {
        let name = self
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_path.display().to_string());
        Notification::info(format!("Exported {}", name))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    /// Encode everything in memory and stage both files before moving either
    /// into place. The image never stays on disk without its settings file.
    pub fn export(
        &self,
        request: &ExportRequest,
        snapshot: &Snapshot,
    ) -> Result<ExportOutcome, ExportError> {
        let surface = request.surface.as_ref().ok_or(ExportError::MissingSurface)?;
        if let Some(resolution) = request.resolution {
            let expected = resolution.dims();
            let actual = surface.dimensions();
            if expected != actual {
                return Err(ExportError::SurfaceSize { expected, actual });
            }
        }

        let encoded = encode(request, surface)?;
        let settings = export_settings(snapshot)?;

        fs::create_dir_all(&request.output_dir)?;
        let basename = export_basename(&request.prefix, &request.timestamp);
        let image_path = request
            .output_dir
            .join(format!("{}.{}", basename, request.format.extension()));
        let settings_path = request.output_dir.join(format!("{}.json", basename));

        let staged_image = stage(&request.output_dir, &encoded)?;
        let staged_settings = stage(&request.output_dir, &settings)?;

        staged_image.persist(&image_path).map_err(|e| e.error)?;
        if let Err(e) = staged_settings.persist(&settings_path) {
            if let Err(cleanup) = fs::remove_file(&image_path) {
                tracing::warn!(
                    path = %image_path.display(),
                    error = %cleanup,
                    "Cannot remove image after settings write failed"
                );
            }
            return Err(e.error.into());
        }

        tracing::info!(
            path = %image_path.display(),
            format = request.format.extension(),
            bytes = encoded.len(),
            "Exported environment"
        );

        Ok(ExportOutcome {
            image_path,
            settings_path,
            bytes_written: encoded.len() + settings.len(),
        })
    }
}

fn encode(request: &ExportRequest, surface: &Surface) -> Result<Vec<u8>, ExportError> {
    match request.format {
        ExportFormat::Hdr => {
            let pixels = project(surface.to_float()?, request.projection)?;
            Ok(encode_hdr(&pixels)?)
        }
        ExportFormat::Exr => {
            let pixels = project(surface.to_float()?, request.projection)?;
            Ok(encode_exr(&pixels, request.compression)?)
        }
        ExportFormat::Png => {
            let pixels = project(surface.to_rgba8()?, request.projection)?;
            let (width, height) = (pixels.width(), pixels.height());
            let image = RgbaImage::from_raw(width, height, pixels.into_data())
                .ok_or(CodecError::Dimensions { width, height })?;
            let mut bytes = io::Cursor::new(Vec::new());
            image.write_to(&mut bytes, ImageFormat::Png)?;
            Ok(bytes.into_inner())
        }
    }
}

fn project<T: crate::codec::Sample>(
    pixels: PixelBuffer<T>,
    projection: Projection,
) -> Result<PixelBuffer<T>, CodecError> {
    match projection {
        Projection::Equirect => Ok(pixels),
        Projection::Matcap { size } => resample_hemisphere(&pixels, size, [T::default(); 4]),
    }
}

/// Fully written temporary file in `dir`, removed on drop unless persisted
fn stage(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
