mod parse;
pub mod prompt;

use marasil_core::{validate_dimensions, Carrier, CarrierProfile, PackageDimensions, ValidationResult};
use serde::{Deserialize, Serialize};

pub use parse::parse_reply;

/// An operation the chat assistant asks the dashboard to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AssistantAction {
    #[serde(rename_all = "camelCase", alias = "create_shipment")]
    CreateShipment {
        carrier: Carrier,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        /// Kilograms
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase", alias = "track_shipment")]
    TrackShipment { tracking_number: String },
    #[serde(rename_all = "camelCase", alias = "cancel_shipment")]
    CancelShipment { tracking_number: String },
    Navigate { path: String },
    /// An action name the dashboard does not know. Only produced by the
    /// parser, never read from a reply.
    #[serde(skip_deserializing)]
    Unknown { name: String },
}

impl AssistantAction {
    /// The package size carried by a `createShipment` action.
    pub fn dimensions(&self) -> Option<PackageDimensions> {
        match self {
            AssistantAction::CreateShipment {
                length,
                width,
                height,
                ..
            } => Some(PackageDimensions {
                length: *length,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }
}

/// A chat reply split into the text shown to the merchant and the action
/// block it carried, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AssistantAction>,
}

impl AssistantReply {
    /// Run the carrier dimension rules on a `createShipment` action, using the
    /// stored profile for its carrier when there is one. `None` for any other
    /// reply.
    pub fn check_shipment(&self, profiles: &[CarrierProfile]) -> Option<ValidationResult> {
        let action = self.action.as_ref()?;
        let AssistantAction::CreateShipment { carrier, .. } = action else {
            return None;
        };
        let dimensions = action.dimensions()?;
        let result = match profiles.iter().find(|p| &p.carrier == carrier) {
            Some(profile) => profile.validate(&dimensions),
            None => validate_dimensions(carrier, &dimensions, None, None),
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marasil_core::BoxSizeOption;

    fn create(carrier: &str, l: f64, w: f64, h: f64) -> AssistantReply {
        AssistantReply {
            text: String::new(),
            action: Some(AssistantAction::CreateShipment {
                carrier: Carrier::from(carrier),
                length: Some(l),
                width: Some(w),
                height: Some(h),
                weight: None,
                description: None,
            }),
        }
    }

    #[test]
    fn action_json_uses_dashboard_names() {
        let action = AssistantAction::TrackShipment {
            tracking_number: "MR123".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "trackShipment");
        assert_eq!(json["trackingNumber"], "MR123");

        let snake: AssistantAction =
            serde_json::from_str(r#"{"action":"cancel_shipment","trackingNumber":"MR9"}"#).unwrap();
        assert_eq!(
            snake,
            AssistantAction::CancelShipment {
                tracking_number: "MR9".to_string()
            }
        );
    }

    #[test]
    fn check_shipment_uses_matching_profile() {
        let profiles = vec![CarrierProfile::new(Carrier::Redbox)
            .with_box_sizes(vec![BoxSizeOption::new("S", 20.0, 20.0, 20.0)])];

        let ok = create("redbox", 10.0, 10.0, 10.0).check_shipment(&profiles).unwrap();
        assert!(ok.valid);

        let too_big = create("redbox", 30.0, 30.0, 30.0).check_shipment(&profiles).unwrap();
        assert!(too_big.error.unwrap().contains("S (20×20×20)"));
    }

    #[test]
    fn check_shipment_without_profile_falls_back_to_defaults() {
        let catalog = create("omniclama", 10.0, 10.0, 10.0).check_shipment(&[]).unwrap();
        assert!(!catalog.valid);

        let aramex = create("aramex", 50.0, 50.0, 41.0).check_shipment(&[]).unwrap();
        assert!(!aramex.valid);
    }

    #[test]
    fn check_shipment_ignores_other_actions() {
        let reply = AssistantReply {
            text: "Opening orders".to_string(),
            action: Some(AssistantAction::Navigate {
                path: "/orders".to_string(),
            }),
        };
        assert!(reply.check_shipment(&[]).is_none());
    }
}
