//! Texture decoding against real files on disk.

use std::path::Path;

use image::{Rgba, RgbaImage};
use inflight_resources::{MaterialPaths, ResourceError, TextureData};

fn write_png(dir: &Path, name: &str, image: &RgbaImage) {
    image.save(dir.join(name)).unwrap();
}

#[test]
fn test_png_decodes_to_rgba8() {
    let dir = tempfile::tempdir().unwrap();
    let image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
    write_png(dir.path(), "solid.png", &image);

    let texture = TextureData::load(&dir.path().join("solid.png")).unwrap();
    assert_eq!((texture.width, texture.height), (3, 2));
    assert_eq!(texture.pixels.len(), 3 * 2 * 4);
    assert!(texture.pixels.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
}

#[test]
fn test_rows_are_flipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut image = RgbaImage::from_pixel(1, 2, Rgba([0, 0, 0, 255]));
    image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    write_png(dir.path(), "top_white.png", &image);

    let texture = TextureData::load(&dir.path().join("top_white.png")).unwrap();
    // The top row of the file ends up last.
    assert_eq!(&texture.pixels[0..4], &[0, 0, 0, 255]);
    assert_eq!(&texture.pixels[4..8], &[255, 255, 255, 255]);
}

#[test]
fn test_garbage_file_is_an_image_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(
        TextureData::load(&path),
        Err(ResourceError::Image(_))
    ));
    assert!(TextureData::load_or_placeholder(&path).is_placeholder());
}

#[test]
fn test_material_load_substitutes_only_missing_textures() {
    let dir = tempfile::tempdir().unwrap();
    write_png(
        dir.path(),
        "base.png",
        &RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255])),
    );
    write_png(
        dir.path(),
        "metal.png",
        &RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
    );

    let material = MaterialPaths::new("base.png", "missing_roughness.jpg", "metal.png");
    let textures = material.load(dir.path());

    assert_eq!(textures.base_color.width, 4);
    assert!(textures.roughness.is_placeholder());
    assert_eq!(textures.metallic.width, 2);
    assert_eq!(textures.in_binding_order()[1], &textures.roughness);
}
