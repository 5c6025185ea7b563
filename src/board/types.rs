//! Board and puzzle description records.
//!
//! These are the values handed to the solver. Field names of the serialized
//! form are stable; empty lists serialize as `[]`, never as absent fields.

use serde::{Deserialize, Serialize};

/// A grid location `(column, row)` or a pixel location `(x, y)`.
pub type Loc = [i32; 2];

/// A placeable piece: its filled block offsets relative to the core block
/// and its dominant hue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleDescription {
    #[serde(rename = "Blocks")]
    pub blocks: Vec<Loc>,
    #[serde(rename = "Hue")]
    pub hue: i32,
}

/// Projection numbers of one hue: one per column, one per row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionDescription {
    #[serde(rename = "XProjList")]
    pub x_proj: Vec<u32>,
    #[serde(rename = "YProjList")]
    pub y_proj: Vec<u32>,
}

impl ProjectionDescription {
    /// Whether the sequences cover a `width` x `height` board.
    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.x_proj.len() as i32 == width && self.y_proj.len() as i32 == height
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedBlockDescription {
    #[serde(rename = "Loc")]
    pub loc: Loc,
    #[serde(rename = "RawLoc")]
    pub raw_loc: Loc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBlockDescription {
    #[serde(rename = "Loc")]
    pub loc: Loc,
    #[serde(rename = "RawLoc")]
    pub raw_loc: Loc,
    #[serde(rename = "Hue")]
    pub hue: i32,
}

/// Everything the solver needs to know about one board.
///
/// `projections`, `locked_blocks` and `hues` are parallel lists: entry `i` of
/// each belongs to hue family `hues[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDescription {
    #[serde(rename = "W")]
    pub width: i32,
    #[serde(rename = "H")]
    pub height: i32,
    #[serde(rename = "ProjDescList")]
    pub projections: Vec<ProjectionDescription>,
    #[serde(rename = "BannedBlockList")]
    pub banned_blocks: Vec<BannedBlockDescription>,
    #[serde(rename = "LockedBlockList")]
    pub locked_blocks: Vec<Vec<LockedBlockDescription>>,
    #[serde(rename = "PuzzleList")]
    pub puzzles: Vec<PuzzleDescription>,
    #[serde(rename = "HueList")]
    pub hues: Vec<i32>,
}

impl BoardDescription {
    /// Serializes to the compact record handed to the solver.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
