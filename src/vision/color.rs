//! HSV sampling of single pixels and pixel areas.
//!
//! Hue is in degrees `[0, 360)`, saturation and value in `[0, 1]`.
//! Samples outside the image read as black.

use image::{Rgba, RgbaImage};
use palette::encoding::Srgb;
use palette::FromColor;

use super::hue::hue_distance;
use super::Rect;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let hsv: palette::Hsv<Srgb, f64> =
        palette::Hsv::from_color(palette::Srgb::new(r, g, b).into_format::<f64>());
    let h = hsv.hue.into_positive_degrees();
    Hsv {
        // Gray has no hue
        h: if hsv.saturation == 0.0 || h >= 360.0 { 0.0 } else { h },
        s: hsv.saturation,
        v: hsv.value,
    }
}

fn pixel_hsv(pixel: &Rgba<u8>) -> Hsv {
    rgb_to_hsv(pixel[0], pixel[1], pixel[2])
}

/// Samples the color of one pixel.
pub fn sample_hsv(img: &RgbaImage, x: i32, y: i32) -> Hsv {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return Hsv::default();
    }
    pixel_hsv(img.get_pixel(x as u32, y as u32))
}

/// Samples one pixel, keeping only colors of the target hue family.
///
/// A pixel whose hue is farther than `tolerance` from `target_hue` reads as
/// black, so saturation/value thresholds reject it.
pub fn sample_hsv_near(img: &RgbaImage, x: i32, y: i32, target_hue: i32, tolerance: i32) -> Hsv {
    let hsv = sample_hsv(img, x, y);
    if hue_distance(hsv.h.round() as i32, target_hue) > tolerance {
        return Hsv {
            h: hsv.h,
            s: 0.0,
            v: 0.0,
        };
    }
    hsv
}

fn area_pixels<'a>(img: &'a RgbaImage, rect: Rect) -> impl Iterator<Item = &'a Rgba<u8>> + 'a {
    let bounds = rect.clip(img.width(), img.height());
    bounds.into_iter().flat_map(move |(x0, y0, x1, y1)| {
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| img.get_pixel(x, y)))
    })
}

fn area_mean_rgb(img: &RgbaImage, rect: Rect) -> Option<[f64; 3]> {
    let mut sum = [0.0f64; 3];
    let mut count = 0usize;
    for p in area_pixels(img, rect) {
        for c in 0..3 {
            sum[c] += p[c] as f64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.map(|s| s / count as f64))
}

/// Color of the mean pixel of an area.
pub fn area_mean_hsv(img: &RgbaImage, rect: Rect) -> Hsv {
    match area_mean_rgb(img, rect) {
        Some([r, g, b]) => rgb_to_hsv(r.round() as u8, g.round() as u8, b.round() as u8),
        None => Hsv::default(),
    }
}

/// Color variance of an area: the mean of the per-channel RGB variances.
pub fn area_variance(img: &RgbaImage, rect: Rect) -> f64 {
    let Some(mean) = area_mean_rgb(img, rect) else {
        return 0.0;
    };
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for p in area_pixels(img, rect) {
        for c in 0..3 {
            let d = p[c] as f64 - mean[c];
            sum += d * d;
        }
        count += 1;
    }
    sum / (count * 3) as f64
}

/// Color of the per-channel median pixel of an area.
///
/// Unlike the mean, this is not pulled off by anti-aliased block edges.
pub fn area_median_hsv(img: &RgbaImage, rect: Rect) -> Hsv {
    let mut channels: [Vec<u8>; 3] = Default::default();
    for p in area_pixels(img, rect) {
        for c in 0..3 {
            channels[c].push(p[c]);
        }
    }
    if channels[0].is_empty() {
        return Hsv::default();
    }
    let [r, g, b] = channels.map(|mut values| {
        values.sort_unstable();
        values[values.len() / 2]
    });
    rgb_to_hsv(r, g, b)
}
