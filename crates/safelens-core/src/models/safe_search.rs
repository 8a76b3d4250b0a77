use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal likelihood scale used by the Cloud Vision safe-search detector.
///
/// Variants are declared from least to most likely so `Ord` follows the scale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    /// Literal label as returned by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Unknown => "UNKNOWN",
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }

    /// `LIKELY` and `VERY_LIKELY` count as flagged.
    pub fn is_flagged(&self) -> bool {
        *self >= Likelihood::Likely
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Likelihood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UNKNOWN" => Ok(Likelihood::Unknown),
            "VERY_UNLIKELY" => Ok(Likelihood::VeryUnlikely),
            "UNLIKELY" => Ok(Likelihood::Unlikely),
            "POSSIBLE" => Ok(Likelihood::Possible),
            "LIKELY" => Ok(Likelihood::Likely),
            "VERY_LIKELY" => Ok(Likelihood::VeryLikely),
            other => Err(format!("Unknown likelihood: {}", other)),
        }
    }
}

// `#[serde(other)]` must sit on the last variant, but `Unknown` is first to
// keep the ordinal scale; unrecognized labels deserialize to `Unknown`.
impl<'de> Deserialize<'de> for Likelihood {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(match label.as_str() {
            "VERY_UNLIKELY" => Likelihood::VeryUnlikely,
            "UNLIKELY" => Likelihood::Unlikely,
            "POSSIBLE" => Likelihood::Possible,
            "LIKELY" => Likelihood::Likely,
            "VERY_LIKELY" => Likelihood::VeryLikely,
            _ => Likelihood::Unknown,
        })
    }
}

/// Content-risk categories reported by the safe-search detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearchCategory {
    Adult,
    Spoof,
    Medical,
    Violence,
    Racy,
}

impl SafeSearchCategory {
    pub const ALL: [SafeSearchCategory; 5] = [
        SafeSearchCategory::Adult,
        SafeSearchCategory::Spoof,
        SafeSearchCategory::Medical,
        SafeSearchCategory::Violence,
        SafeSearchCategory::Racy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SafeSearchCategory::Adult => "adult",
            SafeSearchCategory::Spoof => "spoof",
            SafeSearchCategory::Medical => "medical",
            SafeSearchCategory::Violence => "violence",
            SafeSearchCategory::Racy => "racy",
        }
    }
}

impl fmt::Display for SafeSearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe-search annotation for a single image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeSearchResult {
    pub adult: Likelihood,
    pub spoof: Likelihood,
    pub medical: Likelihood,
    pub violence: Likelihood,
    pub racy: Likelihood,
}

impl SafeSearchResult {
    pub fn likelihood(&self, category: SafeSearchCategory) -> Likelihood {
        match category {
            SafeSearchCategory::Adult => self.adult,
            SafeSearchCategory::Spoof => self.spoof,
            SafeSearchCategory::Medical => self.medical,
            SafeSearchCategory::Violence => self.violence,
            SafeSearchCategory::Racy => self.racy,
        }
    }

    /// Categories in display order, paired with their likelihood
    pub fn categories(&self) -> impl Iterator<Item = (SafeSearchCategory, Likelihood)> + '_ {
        SafeSearchCategory::ALL
            .into_iter()
            .map(move |category| (category, self.likelihood(category)))
    }

    pub fn is_flagged(&self) -> bool {
        self.categories().any(|(_, likelihood)| likelihood.is_flagged())
    }

    /// Highest-ranked category; ties resolve to the earlier category.
    pub fn most_likely(&self) -> (SafeSearchCategory, Likelihood) {
        self.categories()
            .fold((SafeSearchCategory::Adult, self.adult), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }
}

/// A classification together with what the user submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub result: SafeSearchResult,
    pub instructions: String,
    pub original_filename: String,
    pub analyzed_at: DateTime<Utc>,
}
