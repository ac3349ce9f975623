//! Equirectangular to hemisphere ("matcap") reprojection
//!
//! Every output pixel inside the disc is treated as the normal of a unit
//! sphere facing the viewer; the normal is turned into longitude/latitude and
//! the panorama is sampled bilinearly there. The same code path serves 8-bit
//! previews and float exports.

use std::f64::consts::{PI, TAU};

use super::pixels::{CodecError, PixelBuffer, Sample};

/// Longitude offset aligning the panorama seam with the back of the sphere
const LONGITUDE_OFFSET: f64 = 0.25;

/// Normalized disc coordinates of output pixel (x, y); the unit circle spans
/// the image with radius `(size - 1) / 2`.
pub fn disc_coords(x: u32, y: u32, size: u32) -> (f64, f64) {
    let center = (f64::from(size) - 1.0) / 2.0;
    if center <= 0.0 {
        return (0.0, 0.0);
    }
    (
        (f64::from(x) - center) / center,
        (f64::from(y) - center) / center,
    )
}

/// Source texture coordinates `(u, v)` for a point inside the disc, or `None`
/// on or outside the unit circle.
pub fn disc_to_uv(nx: f64, ny: f64) -> Option<(f64, f64)> {
    let r2 = nx * nx + ny * ny;
    if r2 >= 1.0 {
        return None;
    }

    let (x, y, z) = (nx, -ny, (1.0 - r2).sqrt());
    let longitude = (-x).atan2(-z);
    let latitude = y.clamp(-1.0, 1.0).acos();

    let u = (longitude / TAU + LONGITUDE_OFFSET).rem_euclid(1.0);
    let v = latitude / PI;
    Some((u, v))
}

/// Bilinear sample at texture coordinates; wraps horizontally, clamps vertically
fn sample_bilinear<T: Sample>(source: &PixelBuffer<T>, u: f64, v: f64) -> [f32; 3] {
    let width = i64::from(source.width());
    let height = i64::from(source.height());

    let px = u * width as f64 - 0.5;
    let py = v * height as f64 - 0.5;
    let fx = (px - px.floor()) as f32;
    let fy = (py - py.floor()) as f32;

    let x0 = (px.floor() as i64).rem_euclid(width);
    let x1 = (x0 + 1).rem_euclid(width);
    let y0 = (py.floor() as i64).clamp(0, height - 1);
    let y1 = (py.floor() as i64 + 1).clamp(0, height - 1);

    let p00 = source.rgb(x0 as u32, y0 as u32);
    let p10 = source.rgb(x1 as u32, y0 as u32);
    let p01 = source.rgb(x0 as u32, y1 as u32);
    let p11 = source.rgb(x1 as u32, y1 as u32);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

/// Project an equirectangular panorama onto an `output_size`² RGBA disc.
///
/// Pixels on or outside the unit circle get `background`; pixels inside are
/// opaque.
pub fn resample_hemisphere<T: Sample>(
    source: &PixelBuffer<T>,
    output_size: u32,
    background: [T; 4],
) -> Result<PixelBuffer<T>, CodecError> {
    if output_size == 0 {
        return Err(CodecError::Dimensions {
            width: output_size,
            height: output_size,
        });
    }

    let mut data = Vec::with_capacity(output_size as usize * output_size as usize * 4);
    for y in 0..output_size {
        for x in 0..output_size {
            let (nx, ny) = disc_coords(x, y, output_size);
            match disc_to_uv(nx, ny) {
                Some((u, v)) => {
                    let [r, g, b] = sample_bilinear(source, u, v);
                    data.extend_from_slice(&[
                        T::from_f32(r),
                        T::from_f32(g),
                        T::from_f32(b),
                        T::OPAQUE,
                    ]);
                }
                None => data.extend_from_slice(&background),
            }
        }
    }

    PixelBuffer::new(output_size, output_size, 4, data)
}
