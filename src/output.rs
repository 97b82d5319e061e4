//! Output formatting helpers shared by the PDF renderer and the chat digest
//!
//! This module handles:
//! - Label truncation with an ellipsis marker
//! - Currency amount formatting
//! - Trend direction glyphs

use serde::{Deserialize, Serialize};

/// Ellipsis marker appended to truncated labels
const ELLIPSIS: &str = "...";

/// Character budget for account names in the chat digest
pub const ACCOUNT_NAME_BUDGET: usize = 12;

/// Character budget for service names in tables and legends
pub const SERVICE_NAME_BUDGET: usize = 30;

/// Shorten `label` to at most `budget` characters, ending with an ellipsis
/// marker when it was cut. Labels within budget pass through unchanged.
pub fn truncate_label(label: &str, budget: usize) -> String {
    if label.chars().count() <= budget {
        return label.to_string();
    }
    let keep = budget.saturating_sub(ELLIPSIS.len());
    let mut shortened: String = label.chars().take(keep).collect();
    shortened.push_str(ELLIPSIS);
    shortened
}

/// Format a cost amount with its currency, e.g. `USD 1234.56`
pub fn format_amount(currency: &str, amount: f64) -> String {
    format!("{} {:.2}", currency, amount)
}

/// Direction of the month-over-month cost trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    /// Classify a signed percentage change
    pub fn from_pct(pct: f64) -> Self {
        if pct > 0.0 {
            Self::Up
        } else if pct < 0.0 {
            Self::Down
        } else {
            Self::Flat
        }
    }

    /// ASCII glyph used in the PDF document
    pub fn ascii_glyph(&self) -> &'static str {
        match self {
            Self::Up => "^",
            Self::Down => "v",
            Self::Flat => "-",
        }
    }

    /// Emoji glyph used in the chat digest
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Up => "\u{1F534}",   // red circle, costs rising
            Self::Down => "\u{1F7E2}", // green circle, costs falling
            Self::Flat => "\u{26AA}",  // white circle, no change
        }
    }

    /// Signed percentage annotation for the digest summary, e.g. `(+10.0%)`
    pub fn signed_pct(&self, pct: f64) -> String {
        match self {
            Self::Up => format!("(+{:.1}%)", pct),
            Self::Down => format!("({:.1}%)", pct),
            Self::Flat => "(0%)".to_string(),
        }
    }
}
