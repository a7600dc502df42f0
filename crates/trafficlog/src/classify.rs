//! Traffic congestion classification.
//!
//! Maps a vehicle count (normally a dataset's per-interval average) onto one
//! of four congestion levels. Each level carries the display color, the note
//! text used to auto-fill interval annotations, and a travel recommendation.

use serde::{Deserialize, Serialize};

/// Counts strictly above this are [`TrafficLevel::SevereCongestion`].
pub const SEVERE_THRESHOLD: u64 = 500;

/// Counts strictly above this are at least [`TrafficLevel::Congested`].
pub const CONGESTED_THRESHOLD: u64 = 300;

/// Counts strictly above this are at least [`TrafficLevel::Moderate`].
pub const MODERATE_THRESHOLD: u64 = 150;

/// Congestion level derived from a vehicle count.
///
/// Variants are declared from least to most severe, so the derived `Ord`
/// is the severity ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficLevel {
    /// 150 vehicles or fewer.
    FreeFlowing,
    /// More than 150, up to 300.
    Moderate,
    /// More than 300, up to 500.
    Congested,
    /// More than 500.
    SevereCongestion,
}

/// Travel advice attached to a congestion level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// One-line summary of the condition.
    pub headline: &'static str,
    /// Expected extra travel time in minutes, as an inclusive range.
    pub extra_minutes: Option<(u32, u32)>,
    /// Individual pieces of advice.
    pub advice: &'static [&'static str],
}

impl TrafficLevel {
    /// All levels, from least to most severe.
    pub const ALL: [Self; 4] = [
        Self::FreeFlowing,
        Self::Moderate,
        Self::Congested,
        Self::SevereCongestion,
    ];

    /// Classify a vehicle count.
    ///
    /// Boundary values (exactly 500, 300, 150) fall into the lower bucket.
    #[must_use]
    pub fn classify(vehicles: u64) -> Self {
        if vehicles > SEVERE_THRESHOLD {
            Self::SevereCongestion
        } else if vehicles > CONGESTED_THRESHOLD {
            Self::Congested
        } else if vehicles > MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::FreeFlowing
        }
    }

    /// Numeric severity, 0 for free flowing up to 3 for severe congestion.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::FreeFlowing => 0,
            Self::Moderate => 1,
            Self::Congested => 2,
            Self::SevereCongestion => 3,
        }
    }

    /// Stable identifier, identical to the serialized form.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::FreeFlowing => "FREE_FLOWING",
            Self::Moderate => "MODERATE",
            Self::Congested => "CONGESTED",
            Self::SevereCongestion => "SEVERE_CONGESTION",
        }
    }

    /// Inverse of [`TrafficLevel::code`].
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.code() == code)
    }

    /// Upper-case display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FreeFlowing => "FREE FLOWING",
            Self::Moderate => "MODERATE",
            Self::Congested => "CONGESTED",
            Self::SevereCongestion => "SEVERE CONGESTION",
        }
    }

    /// Lower-case label used to auto-fill interval notes.
    #[must_use]
    pub fn note_label(self) -> String {
        self.label().to_lowercase()
    }

    /// Display color as a hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::FreeFlowing => "#28a745",
            Self::Moderate => "#ffc107",
            Self::Congested => "#fd7e14",
            Self::SevereCongestion => "#dc3545",
        }
    }

    /// Travel recommendation for this level.
    #[must_use]
    pub fn recommendation(self) -> Recommendation {
        match self {
            Self::SevereCongestion => Recommendation {
                headline: "Severe congestion",
                extra_minutes: Some((45, 60)),
                advice: &[
                    "Avoid this area during this period",
                    "Look for an alternative route",
                    "Consider public transport",
                ],
            },
            Self::Congested => Recommendation {
                headline: "Congested",
                extra_minutes: Some((30, 45)),
                advice: &[
                    "Check alternative routes before leaving",
                    "Avoid this period if possible",
                ],
            },
            Self::Moderate => Recommendation {
                headline: "Moderate traffic",
                extra_minutes: Some((15, 30)),
                advice: &["Travel time close to normal", "Keep an eye on traffic updates"],
            },
            Self::FreeFlowing => Recommendation {
                headline: "Free flowing",
                extra_minutes: None,
                advice: &["Optimal travel time", "No alternative route needed"],
            },
        }
    }
}

impl std::fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
