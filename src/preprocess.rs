use image::{imageops, Rgb, RgbImage};

pub const CONTRAST_FACTOR: f32 = 1.5;
pub const SHARPNESS_FACTOR: f32 = 1.2;
pub const BLUR_SIGMA: f32 = 0.5;

/// Produce a contrast boosted, sharpened and lightly blurred copy of `image` for a second
/// recognition pass. The input is left untouched.
pub fn enhance(image: &RgbImage) -> RgbImage {
    let contrasted = adjust_contrast(image, CONTRAST_FACTOR);
    let sharpened = adjust_sharpness(&contrasted, SHARPNESS_FACTOR);
    imageops::blur(&sharpened, BLUR_SIGMA)
}

/// Scale every channel away from the image's mean luminance by `factor`.
pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luminance(image);
    map_channels(image, |v| mean + factor * (v - mean))
}

/// Blend between a smoothed copy of the image and the image itself.
///
/// A factor of `1.0` returns the image unchanged, larger factors sharpen.
pub fn adjust_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let smooth = smooth(image);
    let mut out = image.clone();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let degenerate = smooth.get_pixel(x, y);
        let original = image.get_pixel(x, y);
        for c in 0..3 {
            let s = degenerate[c] as f32;
            pixel[c] = clamp_channel(s + factor * (original[c] as f32 - s));
        }
    }

    out
}

fn mean_luminance(image: &RgbImage) -> f32 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }

    let sum: u64 = image
        .pixels()
        .map(|Rgb([r, g, b])| luminance(*r, *g, *b) as u64)
        .sum();

    (sum as f64 / count as f64).round() as f32
}

// ITU-R 601-2 luma
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

/// 3x3 smoothing with a weighted centre; border pixels are kept as-is.
fn smooth(image: &RgbImage) -> RgbImage {
    const KERNEL: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
    const WEIGHT: f32 = 13.0;

    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0.0f32; 3];
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let p = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for c in 0..3 {
                        acc[c] += p[c] as f32 * weight;
                    }
                }
            }
            out.put_pixel(x, y, Rgb(acc.map(|v| clamp_channel(v / WEIGHT))));
        }
    }

    out
}

fn map_channels(image: &RgbImage, f: impl Fn(f32) -> f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = clamp_channel(f(pixel[c] as f32));
        }
    }
    out
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
