//! Rendered surface to files on disk, read back with a conformant decoder

use super::common::fixtures::gradient_panorama;
use chrono::{TimeZone, Utc};
use image::ImageFormat;
use lumen::codec::{disc_to_uv, encode_exr, encode_hdr, f32_to_half};
use lumen::export::{ExportFormat, ExportRequest, Exporter, Projection, Resolution, Surface};
use lumen::{ExrCompression, PixelBuffer, SceneState, Snapshot};
use tempfile::TempDir;

#[test]
fn test_flat_white_radiance_round_trip() {
    let image = PixelBuffer::filled(4, 4, [1.0f32, 1.0, 1.0, 1.0]).unwrap();
    let bytes = encode_hdr(&image).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Hdr)
        .unwrap()
        .into_rgb32f();

    assert_eq!(decoded.dimensions(), (4, 4));
    for pixel in decoded.pixels() {
        for c in pixel.0 {
            assert!((c - 1.0).abs() <= 1.0 / 128.0, "{}", c);
        }
    }
}

#[test]
fn test_gradient_radiance_round_trip() {
    let image = gradient_panorama(64, 32);
    let bytes = encode_hdr(&image).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Hdr)
        .unwrap()
        .into_rgb32f();

    for y in [1, 10, 31] {
        let expected = image.rgb(5, y);
        let got = decoded.get_pixel(5, y).0;
        // The shared exponent follows the brightest channel
        let step = expected[0] / 64.0;
        for c in 0..3 {
            assert!((got[c] - expected[c]).abs() <= step, "row {} channel {}", y, c);
        }
    }
}

#[test]
fn test_exr_zip_matches_uncompressed() {
    let image = gradient_panorama(48, 40);
    let zip = encode_exr(&image, ExrCompression::Zip).unwrap();
    let raw = encode_exr(&image, ExrCompression::None).unwrap();
    assert!(zip.len() < raw.len());

    let a = image::load_from_memory_with_format(&zip, ImageFormat::OpenExr)
        .unwrap()
        .into_rgba32f();
    let b = image::load_from_memory_with_format(&raw, ImageFormat::OpenExr)
        .unwrap()
        .into_rgba32f();
    assert_eq!(a, b);

    let expected = f32_to_half(image.rgb(0, 39)[0]).to_f32();
    assert_eq!(a.get_pixel(0, 39).0[0], expected);
}

#[test]
fn test_matcap_exr_export() {
    let dir = TempDir::new().unwrap();
    let panorama = gradient_panorama(1024, 512);
    let mut request = ExportRequest::new(ExportFormat::Exr, Some(Surface::Float(panorama.clone())));
    request.resolution = Some(Resolution::OneK);
    request.projection = Projection::Matcap { size: 65 };
    request.output_dir = dir.path().to_path_buf();
    request.timestamp = Utc
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .unwrap()
        .with_timezone(&chrono::Local);

    let snapshot = Snapshot::capture(&SceneState::default());
    let outcome = Exporter::new().export(&request, &snapshot).unwrap();
    assert_eq!(outcome.image_path.extension().unwrap(), "exr");
    assert!(outcome.settings_path.exists());

    let matcap = image::open(&outcome.image_path).unwrap().into_rgba32f();
    assert_eq!(matcap.dimensions(), (65, 65));

    // Centre samples the horizon row of the panorama
    let (_, v) = disc_to_uv(0.0, 0.0).unwrap();
    let row = (v * 512.0 - 0.5).floor() as u32;
    let lo = panorama.rgb(0, row)[0];
    let hi = panorama.rgb(0, row + 1)[0];
    let centre = matcap.get_pixel(32, 32).0[0];
    assert!(centre >= lo - 0.01 && centre <= hi + 0.01);

    // Corners are transparent black
    assert_eq!(matcap.get_pixel(0, 0).0[..3], [0.0, 0.0, 0.0]);
}

#[test]
fn test_png_export_from_byte_surface() {
    let dir = TempDir::new().unwrap();
    let surface = Surface::Byte(PixelBuffer::filled(16, 8, [10u8, 20, 30, 255]).unwrap());
    let mut request = ExportRequest::new(ExportFormat::Png, Some(surface));
    request.output_dir = dir.path().join("nested");

    let snapshot = Snapshot::capture(&SceneState::default());
    let outcome = Exporter::new().export(&request, &snapshot).unwrap();
    let png = image::open(&outcome.image_path).unwrap().into_rgba8();
    assert_eq!(png.get_pixel(7, 3).0, [10, 20, 30, 255]);
}
