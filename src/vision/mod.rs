//! Pixel-level primitives shared by every recognition stage.
//!
//! This module provides:
//! - HSV sampling of points and areas (`color`)
//! - Circular hue distance, mean and family clustering (`hue`)
//! - Reference patch search (`template`)

pub mod color;
pub mod hue;
pub mod template;

pub use color::{
    area_mean_hsv, area_median_hsv, area_variance, rgb_to_hsv, sample_hsv, sample_hsv_near, Hsv,
};
pub use hue::{circular_mean, cluster_hues, distinguish_hues, hue_distance, hue_family_name};
pub use template::{NccMatcher, Template, TemplateMatch, TemplateMatcher};

use serde::{Deserialize, Serialize};

/// An axis-aligned pixel rectangle given by its LT corner and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Intersects with a `width` x `height` image.
    ///
    /// Returns `(x0, y0, x1, y1)` with exclusive ends, or `None` when nothing
    /// of the rectangle lies inside the image.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.w as i64).min(width as i64);
        let y1 = (self.y as i64 + self.h as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}
