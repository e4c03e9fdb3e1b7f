//! Carrier package-dimension rules.
//!
//! Pure functions: no I/O, no logging, same inputs always give the same
//! answer. The shipment form calls [`validate_dimensions`] before it submits a
//! shipment to the backend.

use thiserror::Error;

use crate::{BoxSizeOption, Carrier, CarrierRule, MaxBoxDimensions, PackageDimensions, ValidationResult};

/// Bounds applied to bounding-box carriers that publish none of their own.
pub const DEFAULT_MAX_BOX: MaxBoxDimensions = MaxBoxDimensions::new(50.0, 50.0, 40.0);

/// Why a carrier refused a package.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("All three dimensions (length, width, height) are required")]
    MissingDimension,

    #[error("No allowed box sizes are configured for carrier {carrier}")]
    MissingCarrierConfig { carrier: Carrier },

    #[error(
        "Package volume exceeds every allowed box size for {carrier}. Allowed sizes: {}",
        list_options(.options)
    )]
    VolumeExceeded {
        carrier: Carrier,
        options: Vec<BoxSizeOption>,
    },

    #[error("Package exceeds the maximum dimensions for {carrier} ({max} cm)")]
    BoundsExceeded {
        carrier: Carrier,
        max: MaxBoxDimensions,
    },
}

impl Rejection {
    /// Stable machine-readable name for the rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::MissingDimension => "missing_dimension",
            Rejection::MissingCarrierConfig { .. } => "missing_carrier_config",
            Rejection::VolumeExceeded { .. } => "volume_exceeded",
            Rejection::BoundsExceeded { .. } => "bounds_exceeded",
        }
    }
}

fn list_options(options: &[BoxSizeOption]) -> String {
    options
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decide whether `carrier` accepts a package of the given size.
///
/// `allowed_box_sizes` is only read for catalog carriers and
/// `max_box_dimensions` only for bounding-box carriers. Catalog carriers
/// compare volumes: a package passes if some listed box has at least the
/// package's volume, even when a single axis would not physically fit.
pub fn check_dimensions(
    carrier: &Carrier,
    dimensions: &PackageDimensions,
    allowed_box_sizes: Option<&[BoxSizeOption]>,
    max_box_dimensions: Option<&MaxBoxDimensions>,
) -> Result<(), Rejection> {
    let [length, width, height] = dimensions.measured().ok_or(Rejection::MissingDimension)?;

    match carrier.rule() {
        CarrierRule::Catalog => {
            let options = match allowed_box_sizes {
                Some(options) if !options.is_empty() => options,
                _ => {
                    return Err(Rejection::MissingCarrierConfig {
                        carrier: carrier.clone(),
                    })
                }
            };
            let volume = length * width * height;
            if options.iter().any(|o| o.volume() >= volume) {
                Ok(())
            } else {
                Err(Rejection::VolumeExceeded {
                    carrier: carrier.clone(),
                    options: options.to_vec(),
                })
            }
        }
        CarrierRule::BoundingBox => {
            let max = max_box_dimensions.copied().unwrap_or(DEFAULT_MAX_BOX);
            if length > max.length || width > max.width || height > max.height {
                Err(Rejection::BoundsExceeded {
                    carrier: carrier.clone(),
                    max,
                })
            } else {
                Ok(())
            }
        }
        CarrierRule::Unconstrained => Ok(()),
    }
}

/// [`check_dimensions`] folded into the `{ valid, error? }` shape the
/// dashboard displays.
pub fn validate_dimensions(
    carrier: &Carrier,
    dimensions: &PackageDimensions,
    allowed_box_sizes: Option<&[BoxSizeOption]>,
    max_box_dimensions: Option<&MaxBoxDimensions>,
) -> ValidationResult {
    check_dimensions(carrier, dimensions, allowed_box_sizes, max_box_dimensions).into()
}
