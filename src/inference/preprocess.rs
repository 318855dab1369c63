//! Image preprocessing
//!
//! Decoded images become a `[1, 3, 224, 224]` tensor: RGB conversion, exact
//! resize with a PIL-compatible bilinear filter, scaling to `[0, 1]` and
//! ImageNet per-channel normalization in CHW layout.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{DynamicImage, Rgb, RgbImage};

use crate::utils::error::{ClassifierError, Result};
use crate::IMAGE_SIZE;

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode raw upload bytes into an image, sniffing the format from content
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| ClassifierError::Decode(e.to_string()))
}

/// PIL-compatible bilinear resize with anti-aliasing.
///
/// For downscaling the triangle filter's support grows with the scale factor,
/// which matches PIL's `Image.resize(size, BILINEAR)`.
pub fn bilinear_resize(src: &RgbImage, target_width: u32, target_height: u32) -> RgbImage {
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;
    let target_width = target_width as usize;
    let target_height = target_height as usize;

    let mut dst = RgbImage::new(target_width as u32, target_height as u32);

    let x_scale = src_width as f32 / target_width as f32;
    let y_scale = src_height as f32 / target_height as f32;

    let support_x = x_scale.max(1.0);
    let support_y = y_scale.max(1.0);

    for dy in 0..target_height {
        for dx in 0..target_width {
            // Center of output pixel in source coordinates
            let src_cx = (dx as f32 + 0.5) * x_scale;
            let src_cy = (dy as f32 + 0.5) * y_scale;

            let x_min = (src_cx - support_x).floor().max(0.0) as usize;
            let x_max = (src_cx + support_x).ceil().min(src_width as f32 - 1.0) as usize;
            let y_min = (src_cy - support_y).floor().max(0.0) as usize;
            let y_max = (src_cy + support_y).ceil().min(src_height as f32 - 1.0) as usize;

            let mut total_weight = 0.0f32;
            let mut weighted_sum = [0.0f32; 3];

            for sy in y_min..=y_max {
                let dist_y = ((sy as f32 + 0.5) - src_cy).abs() / support_y;
                if dist_y >= 1.0 {
                    continue;
                }
                for sx in x_min..=x_max {
                    let dist_x = ((sx as f32 + 0.5) - src_cx).abs() / support_x;
                    if dist_x >= 1.0 {
                        continue;
                    }

                    let weight = (1.0 - dist_x) * (1.0 - dist_y);
                    let pixel = src.get_pixel(sx as u32, sy as u32);
                    for (sum, &channel) in weighted_sum.iter_mut().zip(pixel.0.iter()) {
                        *sum += channel as f32 * weight;
                    }
                    total_weight += weight;
                }
            }

            if total_weight > 0.0 {
                let [r, g, b] = weighted_sum.map(|sum| (sum / total_weight).round().clamp(0.0, 255.0) as u8);
                dst.put_pixel(dx as u32, dy as u32, Rgb([r, g, b]));
            }
        }
    }

    dst
}

/// Normalize an RGB image to a flat vector with ImageNet normalization
/// Returns CHW layout: [C, H, W] flattened
pub fn normalize_chw(image: &RgbImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let num_pixels = (width * height) as usize;

    let mut normalized = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            normalized[c * num_pixels + i] =
                (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    normalized
}

/// Resize and normalize an image into `3 * 224 * 224` CHW values
pub fn preprocess_to_vec(image: &DynamicImage) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let side = IMAGE_SIZE as u32;
    let resized = if rgb.dimensions() == (side, side) {
        rgb
    } else {
        bilinear_resize(&rgb, side, side)
    };
    normalize_chw(&resized)
}

/// Preprocess an image into a `[1, 3, 224, 224]` tensor on `device`
pub fn preprocess<B: Backend>(image: &DynamicImage, device: &B::Device) -> Tensor<B, 4> {
    let data = preprocess_to_vec(image);
    Tensor::<B, 4>::from_floats(TensorData::new(data, [1, 3, IMAGE_SIZE, IMAGE_SIZE]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    type TestBackend = NdArray;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn test_any_size_yields_fixed_shape() {
        let device = Default::default();
        for (w, h) in [(1, 1), (500, 37), (224, 224), (37, 640), (300, 300)] {
            let image = DynamicImage::new_rgb8(w, h);
            let tensor = preprocess::<TestBackend>(&image, &device);
            assert_eq!(tensor.dims(), [1, 3, 224, 224], "input {}x{}", w, h);
        }
    }

    #[test]
    fn test_normalization_constants() {
        let white = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let values = normalize_chw(&white);
        assert_eq!(values.len(), 3 * 4);

        for c in 0..3 {
            let expected = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            for i in 0..4 {
                assert!((values[c * 4 + i] - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_chw_layout() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 255, 0]));
        let values = normalize_chw(&image);

        // Red plane first, then green, then blue
        let red_high = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green_high = (1.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((values[0] - red_high).abs() < 1e-6);
        assert!((values[3] - green_high).abs() < 1e-6);
        assert!(values[1] < 0.0);
    }

    #[test]
    fn test_resize_preserves_flat_color() {
        let src = RgbImage::from_pixel(640, 480, Rgb([10, 120, 250]));
        let resized = bilinear_resize(&src, 224, 224);
        assert_eq!(resized.dimensions(), (224, 224));
        assert!(resized.pixels().all(|p| p.0 == [10, 120, 250]));

        let upscaled = bilinear_resize(&RgbImage::from_pixel(3, 5, Rgb([7, 7, 7])), 224, 224);
        assert!(upscaled.pixels().all(|p| p.0 == [7, 7, 7]));
    }

    #[test]
    fn test_resize_is_deterministic() {
        let src = RgbImage::from_fn(97, 53, |x, y| Rgb([(x * 2) as u8, (y * 4) as u8, ((x + y) % 256) as u8]));
        assert_eq!(bilinear_resize(&src, 224, 224), bilinear_resize(&src, 224, 224));
    }

    #[test]
    fn test_grayscale_becomes_three_channels() {
        let gray = DynamicImage::ImageLuma8(image::ImageBuffer::from_pixel(50, 50, Luma([128u8])));
        let values = preprocess_to_vec(&gray);
        assert_eq!(values.len(), 3 * IMAGE_SIZE * IMAGE_SIZE);
    }

    #[test]
    fn test_decode_png_and_jpeg() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([200, 100, 50])));

        let png = decode_image(&encode(&image, ImageFormat::Png)).unwrap();
        assert_eq!((png.width(), png.height()), (16, 8));

        let jpeg = decode_image(&encode(&image, ImageFormat::Jpeg)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (16, 8));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(ClassifierError::Decode(_))));
        assert!(matches!(decode_image(&[]), Err(ClassifierError::Decode(_))));

        // Valid JPEG header followed by junk
        let corrupt = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x02];
        assert!(decode_image(&corrupt).is_err());
    }
}
