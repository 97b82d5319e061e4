//! Report document model
//!
//! The renderer produces an ordered list of immutable drawing blocks; the
//! paginating PDF writer consumes them. Layout decisions live entirely in
//! the block list, so the document structure is testable without a
//! rendering backend.

pub mod pdf;
pub mod renderer;

use crate::{output::TrendDirection, providers::OrgIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An RGB color used for fills and emphasis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Brand band behind the page header logo and the summary banner
pub const BRAND_BLUE: Rgb8 = Rgb8::new(30, 65, 100);

/// Gold fill marking the highest spender
pub const HIGHLIGHT_GOLD: Rgb8 = Rgb8::new(255, 215, 0);

/// Segment palette for the service distribution bar; the final entry is the
/// gray reserved for the merged remainder
pub const SERVICE_PALETTE: [Rgb8; 6] = [
    Rgb8::new(70, 130, 180),
    Rgb8::new(100, 149, 237),
    Rgb8::new(135, 206, 235),
    Rgb8::new(176, 224, 230),
    Rgb8::new(173, 216, 230),
    Rgb8::new(211, 211, 211),
];

/// Visual tone of a callout box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalloutTone {
    /// Gold border on light yellow, for the highest spender
    Highlight,
    /// Green border on light green, for the lowest spender
    Positive,
}

/// A bordered table with optional emphasis on the first data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Column widths in millimeters
    pub col_widths: Vec<f64>,
    /// Emphasize row 0 (the highest spender)
    pub highlight_top: bool,
}

/// A titled, boxed set of lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub title: String,
    pub lines: Vec<String>,
    pub tone: CalloutTone,
}

/// One segment of the proportional stacked bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSegment {
    pub label: String,
    /// Share of the bar, 0.0..=1.0
    pub fraction: f64,
    pub color: Rgb8,
}

/// One legend entry beneath the stacked bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub pct: f64,
    pub color: Rgb8,
}

/// A single drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    /// Full-width filled title band
    Banner(String),
    /// Centered bold line
    CenteredLine(String),
    /// Boxed, centered emphasis line (the total-cost badge)
    Badge(String),
    /// Chapter title with a light fill
    Heading(String),
    /// Bold sub-heading without fill
    SubHeading(String),
    /// Plain paragraph line
    TextLine(String),
    /// Trend line colored by direction, rendered as `label: <glyph> N.N%`
    TrendLine {
        label: String,
        pct: f64,
        direction: TrendDirection,
    },
    Table(Table),
    Callout(Callout),
    /// Left-to-right proportional bar with a bounding border
    StackedBar(Vec<BarSegment>),
    /// Two-column legend, first half of the entries in the left column
    Legend(Vec<LegendEntry>),
    /// Filled recommendation title followed by wrapped body text
    Recommendation { title: String, body: String },
    /// Centered italic placeholder for the no-data case
    Placeholder(String),
    PageBreak,
}

/// The rendered report: metadata plus the ordered block list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub org: OrgIdentity,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Count blocks matching a predicate; convenience for structural tests
    pub fn count_blocks<F: Fn(&Block) -> bool>(&self, predicate: F) -> usize {
        self.blocks.iter().filter(|b| predicate(b)).count()
    }
}
