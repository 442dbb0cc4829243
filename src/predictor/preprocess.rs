//! Deterministic image to tensor transform.
//!
//! Matches the torchvision pipeline the classifier was trained with:
//! resize to a fixed square, scale to `[0, 1]`, normalize per channel
//! with the ImageNet statistics.

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

pub const IMAGE_SIZE: u32 = 224;

pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Turn an image of any size and color type into a `[1, 3, 224, 224]` NCHW tensor.
pub fn to_tensor(image: &DynamicImage) -> Array4<f32> {
    let size = IMAGE_SIZE as usize;
    let rgb = image
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Triangle)
        .to_rgb8();

    Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c]
    })
}
