//! Radiance `.hdr` (RGBE) encoder
//!
//! Writes the standard text header followed by new-style run-length encoded
//! scanlines: each scanline starts with the `2 2 hi lo` marker and stores the
//! R, G, B and E planes one after another.

use super::pixels::{PixelBuffer, Sample};
use super::CodecError;

/// Longest run a single RLE code can express
const MAX_RUN: usize = 127;
/// Longest literal chunk a single RLE code can express
const MAX_LITERAL: usize = 128;
/// Shortest repeat worth encoding as a run
const MIN_RUN: usize = 4;
/// Scanline width limit of the new RLE format
const MAX_WIDTH: u32 = 0x7fff;

/// Convert linear RGB to the shared-exponent RGBE representation
pub fn rgb_to_rgbe([r, g, b]: [f32; 3]) -> [u8; 4] {
    if ![r, g, b].iter().all(|c| c.is_finite()) {
        return [0; 4];
    }
    let max = r.max(g).max(b);
    if max <= 1e-32 {
        return [0; 4];
    }

    // ceil(log2(max)) leaves max/2^e in (0.5, 1]; exact powers of two land on
    // 1.0 and need one more step to stay below 256 after scaling.
    let mut exponent = max.log2().ceil() as i32;
    if max / 2f32.powi(exponent) >= 1.0 {
        exponent += 1;
    }
    if exponent > 127 {
        return [255, 255, 255, 255];
    }
    if exponent < -128 {
        return [0; 4];
    }

    let scale = 256.0 / 2f64.powi(exponent);
    let mantissa = |c: f32| (f64::from(c.max(0.0)) * scale).floor().min(255.0) as u8;
    [
        mantissa(r),
        mantissa(g),
        mantissa(b),
        (exponent + 128) as u8,
    ]
}

/// Run-length encode one channel plane of a scanline
pub fn rle_encode(data: &[u8], out: &mut Vec<u8>) {
    let len = data.len();
    let mut cur = 0;

    while cur < len {
        let mut beg_run = cur;
        let mut run_count = 0;
        let mut old_run_count = 0;

        // Find the next run of at least MIN_RUN identical bytes
        while run_count < MIN_RUN && beg_run < len {
            beg_run += run_count;
            old_run_count = run_count;
            run_count = 1;
            while beg_run + run_count < len
                && run_count < MAX_RUN
                && data[beg_run] == data[beg_run + run_count]
            {
                run_count += 1;
            }
        }

        // A short run right before the long one is still cheaper as a run
        if old_run_count > 1 && old_run_count == beg_run - cur {
            out.push((128 + old_run_count) as u8);
            out.push(data[cur]);
            cur = beg_run;
        }

        // Literals up to the start of the run
        while cur < beg_run {
            let count = (beg_run - cur).min(MAX_LITERAL);
            out.push(count as u8);
            out.extend_from_slice(&data[cur..cur + count]);
            cur += count;
        }

        if run_count >= MIN_RUN {
            out.push((128 + run_count) as u8);
            out.push(data[beg_run]);
            cur += run_count;
        }
    }
}

/// Encode an RGB(A) float buffer as a Radiance `.hdr` file
pub fn encode_hdr<T: Sample>(image: &PixelBuffer<T>) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (image.width(), image.height());
    if width > MAX_WIDTH {
        return Err(CodecError::Dimensions { width, height });
    }

    let header = format!(
        "#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {} +X {}\n",
        height, width
    );

    let w = width as usize;
    let mut out = Vec::with_capacity(header.len() + image.data().len() * 4 / image.channels());
    out.extend_from_slice(header.as_bytes());

    let mut planes = vec![0u8; w * 4];
    for y in 0..height {
        for x in 0..width {
            let rgbe = rgb_to_rgbe(image.rgb(x, y));
            for (plane, byte) in rgbe.iter().enumerate() {
                planes[plane * w + x as usize] = *byte;
            }
        }

        out.extend_from_slice(&[2, 2, (width >> 8) as u8, (width & 0xff) as u8]);
        for plane in planes.chunks_exact(w) {
            rle_encode(plane, &mut out);
        }
    }

    Ok(out)
}
