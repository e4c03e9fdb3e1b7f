pub mod dimensions;
pub mod error;
pub mod profiles;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use dimensions::{check_dimensions, validate_dimensions, Rejection, DEFAULT_MAX_BOX};
pub use error::{CoreError, CoreResult};
pub use profiles::{
    data_dir, delete_profile, list_profiles, read_profile, upsert_profile, write_profiles,
    CarrierProfile,
};

// --- Types (matching the dashboard's shipment types) ---

/// Package measurements in centimeters, as entered on the shipment form.
///
/// Every axis is optional because the form may submit before all three are
/// filled in. An axis only counts as present when it is a finite number
/// greater than zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl PackageDimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length: Some(length),
            width: Some(width),
            height: Some(height),
        }
    }

    /// All three axes as `[length, width, height]`, or `None` if any is missing.
    pub fn measured(&self) -> Option<[f64; 3]> {
        let axis = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        Some([axis(self.length)?, axis(self.width)?, axis(self.height)?])
    }

    pub fn volume(&self) -> Option<f64> {
        self.measured().map(|[l, w, h]| l * w * h)
    }
}

/// A named box size published by a catalog carrier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxSizeOption {
    /// Display label, e.g. "Small"
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxSizeOption {
    pub fn new(label: impl Into<String>, length: f64, width: f64, height: f64) -> Self {
        Self {
            label: label.into(),
            length,
            width,
            height,
        }
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

impl fmt::Display for BoxSizeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}×{}×{})",
            self.label, self.length, self.width, self.height
        )
    }
}

/// Per-axis upper bound for bounding-box carriers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaxBoxDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl MaxBoxDimensions {
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}

impl fmt::Display for MaxBoxDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}×{}", self.length, self.width, self.height)
    }
}

/// How a carrier decides whether it accepts a package.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CarrierRule {
    /// Package must fit (by volume) into one of the published box sizes.
    Catalog,
    /// Package must stay within a maximum length, width and height.
    BoundingBox,
    /// No size constraint is known for the carrier.
    Unconstrained,
}

/// Shipping carrier, keyed by the tag the dashboard uses.
///
/// Unrecognized tags are kept, lowercased, in [`Carrier::Other`] and are
/// never constrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Carrier {
    Redbox,
    Omniclama,
    Smsa,
    Aramex,
    Other(String),
}

impl Carrier {
    /// Carriers with built-in rules, in display order.
    pub const KNOWN: [Carrier; 4] = [
        Carrier::Redbox,
        Carrier::Omniclama,
        Carrier::Smsa,
        Carrier::Aramex,
    ];

    pub fn tag(&self) -> &str {
        match self {
            Carrier::Redbox => "redbox",
            Carrier::Omniclama => "omniclama",
            Carrier::Smsa => "smsa",
            Carrier::Aramex => "aramex",
            Carrier::Other(tag) => tag,
        }
    }

    pub fn rule(&self) -> CarrierRule {
        match self {
            Carrier::Redbox | Carrier::Omniclama => CarrierRule::Catalog,
            Carrier::Smsa | Carrier::Aramex => CarrierRule::BoundingBox,
            Carrier::Other(_) => CarrierRule::Unconstrained,
        }
    }
}

impl From<&str> for Carrier {
    fn from(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "redbox" => Carrier::Redbox,
            "omniclama" => Carrier::Omniclama,
            "smsa" => Carrier::Smsa,
            "aramex" => Carrier::Aramex,
            _ => Carrier::Other(tag),
        }
    }
}

impl From<String> for Carrier {
    fn from(tag: String) -> Self {
        Carrier::from(tag.as_str())
    }
}

impl From<Carrier> for String {
    fn from(carrier: Carrier) -> Self {
        match carrier {
            Carrier::Other(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl FromStr for Carrier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Carrier::from(s))
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Outcome handed back to the shipment form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<(), Rejection>> for ValidationResult {
    fn from(outcome: Result<(), Rejection>) -> Self {
        match outcome {
            Ok(()) => ValidationResult::accepted(),
            Err(rejection) => ValidationResult::rejected(rejection.to_string()),
        }
    }
}
