//! Carrier profiles: the box catalogs and size bounds the backend publishes
//! per carrier, persisted under the data directory as `carriers.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::{
    validate_dimensions, BoxSizeOption, Carrier, CarrierRule, MaxBoxDimensions, PackageDimensions,
    ValidationResult,
};

const PROFILES_FILE: &str = "carriers.json";

/// Size constraints for a single carrier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarrierProfile {
    pub carrier: Carrier,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_box_sizes: Vec<BoxSizeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_box_dimensions: Option<MaxBoxDimensions>,
}

impl CarrierProfile {
    pub fn new(carrier: Carrier) -> Self {
        Self {
            carrier,
            allowed_box_sizes: Vec::new(),
            max_box_dimensions: None,
        }
    }

    pub fn with_box_sizes(mut self, sizes: Vec<BoxSizeOption>) -> Self {
        self.allowed_box_sizes = sizes;
        self
    }

    pub fn with_max_box(mut self, max: MaxBoxDimensions) -> Self {
        self.max_box_dimensions = Some(max);
        self
    }

    /// Validate a package against this profile's constraints.
    pub fn validate(&self, dimensions: &PackageDimensions) -> ValidationResult {
        validate_dimensions(
            &self.carrier,
            dimensions,
            Some(&self.allowed_box_sizes),
            self.max_box_dimensions.as_ref(),
        )
    }

    /// Reject profiles the validator could never accept a package against.
    pub fn check(&self) -> CoreResult<()> {
        if self.carrier.rule() == CarrierRule::Catalog && self.allowed_box_sizes.is_empty() {
            return Err(CoreError::invalid(
                &self.carrier,
                "catalog carriers need at least one allowed box size",
            ));
        }

        let mut labels = HashSet::new();
        for option in &self.allowed_box_sizes {
            if option.label.trim().is_empty() {
                return Err(CoreError::invalid(&self.carrier, "box size label is empty"));
            }
            if !labels.insert(option.label.as_str()) {
                return Err(CoreError::invalid(
                    &self.carrier,
                    format!("duplicate box size label '{}'", option.label),
                ));
            }
            if !positive(&[option.length, option.width, option.height]) {
                return Err(CoreError::invalid(
                    &self.carrier,
                    format!("box size '{}' has a non-positive dimension", option.label),
                ));
            }
        }

        if let Some(max) = &self.max_box_dimensions {
            if !positive(&[max.length, max.width, max.height]) {
                return Err(CoreError::invalid(
                    &self.carrier,
                    format!("maximum dimensions {max} must all be positive"),
                ));
            }
        }

        Ok(())
    }
}

fn positive(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v > 0.0)
}

// --- Storage ---

/// Resolve the data directory: `$MARASIL_HOME`, else `~/.marasil/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("MARASIL_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marasil")
}

fn profiles_path(dir: &Path) -> PathBuf {
    dir.join(PROFILES_FILE)
}

/// All stored profiles, sorted by carrier tag. A missing file means none.
pub fn list_profiles() -> CoreResult<Vec<CarrierProfile>> {
    list_profiles_in(&data_dir())
}

pub fn list_profiles_in(dir: &Path) -> CoreResult<Vec<CarrierProfile>> {
    let path = profiles_path(dir);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no carrier file, using empty profile list");
        return Ok(vec![]);
    }
    let raw = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
    let profiles: Vec<CarrierProfile> =
        serde_json::from_str(&raw).map_err(|e| CoreError::json(&path, e))?;
    tracing::debug!(path = %path.display(), count = profiles.len(), "loaded carrier profiles");
    Ok(profiles)
}

pub fn read_profile(carrier: &Carrier) -> CoreResult<Option<CarrierProfile>> {
    read_profile_in(&data_dir(), carrier)
}

pub fn read_profile_in(dir: &Path, carrier: &Carrier) -> CoreResult<Option<CarrierProfile>> {
    Ok(list_profiles_in(dir)?
        .into_iter()
        .find(|p| &p.carrier == carrier))
}

pub fn write_profiles(profiles: &[CarrierProfile]) -> CoreResult<()> {
    write_profiles_in(&data_dir(), profiles)
}

/// Replace the stored profile list.
///
/// Uses atomic write (temp file + rename) so a concurrent reader never sees
/// a half-written file.
pub fn write_profiles_in(dir: &Path, profiles: &[CarrierProfile]) -> CoreResult<()> {
    let mut sorted = profiles.to_vec();
    sorted.sort_by(|a, b| a.carrier.tag().cmp(b.carrier.tag()));

    fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;
    let path = profiles_path(dir);
    let tmp = dir.join(format!(".{PROFILES_FILE}.tmp"));
    let json = serde_json::to_string_pretty(&sorted).map_err(|e| CoreError::json(&path, e))?;
    fs::write(&tmp, json).map_err(|e| CoreError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| CoreError::io(&path, e))?;
    tracing::info!(path = %path.display(), count = sorted.len(), "wrote carrier profiles");
    Ok(())
}

pub fn upsert_profile(profile: CarrierProfile) -> CoreResult<()> {
    upsert_profile_in(&data_dir(), profile)
}

/// Insert or replace the profile for `profile.carrier` after checking it.
#[tracing::instrument(skip_all, fields(carrier = %profile.carrier))]
pub fn upsert_profile_in(dir: &Path, profile: CarrierProfile) -> CoreResult<()> {
    profile.check()?;
    let mut profiles = list_profiles_in(dir)?;
    match profiles.iter_mut().find(|p| p.carrier == profile.carrier) {
        Some(existing) => *existing = profile,
        None => profiles.push(profile),
    }
    write_profiles_in(dir, &profiles)
}

pub fn delete_profile(carrier: &Carrier) -> CoreResult<bool> {
    delete_profile_in(&data_dir(), carrier)
}

/// Remove the profile for `carrier`. Returns whether one was stored.
#[tracing::instrument(skip(dir))]
pub fn delete_profile_in(dir: &Path, carrier: &Carrier) -> CoreResult<bool> {
    let mut profiles = list_profiles_in(dir)?;
    let before = profiles.len();
    profiles.retain(|p| &p.carrier != carrier);
    if profiles.len() == before {
        return Ok(false);
    }
    write_profiles_in(dir, &profiles)?;
    Ok(true)
}
