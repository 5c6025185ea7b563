//! Reference patch search.
//!
//! Recognition only depends on the `TemplateMatcher` trait. `NccMatcher` is
//! the bundled implementation: grayscale normalized cross-correlation over
//! the search region, followed by greedy non-maximum suppression.

use anyhow::{anyhow, Context, Result};
use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use std::collections::HashMap;
use std::path::Path;

use super::Rect;

/// Reference patches used by recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    /// Marker drawn above every column (top projection figure)
    ProjX,
    /// Marker drawn left of every row (left projection figure)
    ProjY,
    /// Marker drawn on an unusable board cell
    BlockBanned,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::ProjX, Template::ProjY, Template::BlockBanned];

    /// File name of the reference patch inside the template directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Template::ProjX => "ProjX.png",
            Template::ProjY => "ProjY.png",
            Template::BlockBanned => "BlockBanned.png",
        }
    }
}

/// One occurrence of a reference patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateMatch {
    /// LT corner of the matched area
    pub x: i32,
    pub y: i32,
    pub center_x: i32,
    pub center_y: i32,
    /// Match confidence in `[0, 1]`
    pub score: f64,
}

/// Searches an image for occurrences of a reference patch.
pub trait TemplateMatcher {
    /// Returns at most `max_matches` matches inside `roi`, best first.
    fn match_all(
        &self,
        img: &RgbaImage,
        template: Template,
        roi: Rect,
        max_matches: usize,
    ) -> Result<Vec<TemplateMatch>>;
}

/// Normalized cross-correlation matcher over grayscale reference patches.
pub struct NccMatcher {
    patches: HashMap<Template, GrayImage>,
    threshold: f64,
}

impl NccMatcher {
    /// Creates a matcher without patches. Matches scoring below `threshold` are dropped.
    pub fn new(threshold: f64) -> Self {
        Self {
            patches: HashMap::new(),
            threshold,
        }
    }

    /// Registers the reference patch for `template`.
    pub fn with_patch(mut self, template: Template, patch: GrayImage) -> Self {
        self.patches.insert(template, patch);
        self
    }

    /// Loads every reference patch from `dir`.
    pub fn load_dir(dir: &Path, threshold: f64) -> Result<Self> {
        let mut matcher = Self::new(threshold);
        for template in Template::ALL {
            let path = dir.join(template.file_name());
            let patch = image::open(&path)
                .with_context(|| format!("Failed to load template {}", path.display()))?
                .into_luma8();
            crate::log(&format!(
                "Loaded template {} ({}x{})",
                template.file_name(),
                patch.width(),
                patch.height()
            ));
            matcher.patches.insert(template, patch);
        }
        Ok(matcher)
    }
}

impl TemplateMatcher for NccMatcher {
    fn match_all(
        &self,
        img: &RgbaImage,
        template: Template,
        roi: Rect,
        max_matches: usize,
    ) -> Result<Vec<TemplateMatch>> {
        let patch = self
            .patches
            .get(&template)
            .ok_or_else(|| anyhow!("No reference patch for {:?}", template))?;

        let Some((x0, y0, x1, y1)) = roi.clip(img.width(), img.height()) else {
            return Ok(Vec::new());
        };
        let (tw, th) = patch.dimensions();
        if tw == 0 || th == 0 || x1 - x0 < tw || y1 - y0 < th {
            return Ok(Vec::new());
        }

        let region = image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image();
        let gray = image::imageops::grayscale(&region);

        let mut candidates = correlate(&gray, patch, self.threshold);
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut kept: Vec<TemplateMatch> = Vec::new();
        for (x, y, score) in candidates {
            if kept.len() >= max_matches {
                break;
            }
            let x = x as i32 + x0 as i32;
            let y = y as i32 + y0 as i32;
            let overlaps = kept
                .iter()
                .any(|m| (m.x - x).abs() < tw as i32 && (m.y - y).abs() < th as i32);
            if overlaps {
                continue;
            }
            kept.push(TemplateMatch {
                x,
                y,
                center_x: x + tw as i32 / 2,
                center_y: y + th as i32 / 2,
                score,
            });
        }
        Ok(kept)
    }
}

/// Scores every placement of `patch` inside `gray`.
///
/// Returns `(x, y, score)` for placements scoring at least `threshold`.
/// Placements over a region with no energy have no defined score and are
/// skipped.
fn correlate(gray: &GrayImage, patch: &GrayImage, threshold: f64) -> Vec<(u32, u32, f64)> {
    let scores = match_template(gray, patch, MatchTemplateMethod::CrossCorrelationNormalized);
    scores
        .enumerate_pixels()
        .filter_map(|(x, y, score)| {
            let score = score[0] as f64;
            (score.is_finite() && score >= threshold).then_some((x, y, score))
        })
        .collect()
}
