use marasil_assist::{parse_reply, prompt, AssistantReply};
use marasil_core::{
    validate_dimensions, BoxSizeOption, Carrier, CarrierProfile, CoreResult, MaxBoxDimensions,
    PackageDimensions, ValidationResult,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ValidateDimensionsRequest {
    /// Carrier tag, e.g. "redbox", "omniclama", "smsa", "aramex". Unknown tags have no size rule.
    carrier: String,
    /// Package length in centimeters
    length: Option<f64>,
    /// Package width in centimeters
    width: Option<f64>,
    /// Package height in centimeters
    height: Option<f64>,
    /// Allowed box sizes for catalog carriers. When both this and max_box_dimensions are omitted, the stored carrier profile is used.
    allowed_box_sizes: Option<Vec<BoxSizeOption>>,
    /// Maximum length/width/height for bounding-box carriers. Default: 50×50×40 cm.
    max_box_dimensions: Option<MaxBoxDimensions>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CarrierRequest {
    /// Carrier tag, e.g. "redbox"
    carrier: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetCarrierRequest {
    /// Carrier tag, e.g. "redbox"
    carrier: String,
    /// Published box sizes (required for catalog carriers redbox and omniclama)
    allowed_box_sizes: Option<Vec<BoxSizeOption>>,
    /// Maximum package dimensions (bounding-box carriers smsa and aramex)
    max_box_dimensions: Option<MaxBoxDimensions>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ParseReplyRequest {
    /// Raw text of the assistant's reply
    reply: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AssistantPromptRequest {
    /// The merchant's question
    question: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedReply {
    #[serde(flatten)]
    reply: AssistantReply,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipment_check: Option<ValidationResult>,
}

// --- Server ---

#[derive(Clone)]
pub struct MarasilServer {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MarasilServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Check whether a carrier accepts a package. Returns {valid, error?}. Catalog carriers (redbox, omniclama) compare the package volume against their allowed box sizes; bounding-box carriers (smsa, aramex) check each axis against a maximum. If neither allowed_box_sizes nor max_box_dimensions is given, the stored carrier profile is used."
    )]
    fn validate_dimensions(
        &self,
        Parameters(req): Parameters<ValidateDimensionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        match resolve_validation(&req, marasil_core::read_profile) {
            Ok(result) => {
                tracing::info!(carrier = %req.carrier, valid = result.valid, "validated dimensions");
                json_result(&result)
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to load profile for carrier '{}': {}",
                req.carrier, e
            ))])),
        }
    }

    #[tool(description = "List stored carrier profiles (box catalogs and maximum dimensions)")]
    fn list_carriers(&self) -> Result<CallToolResult, McpError> {
        match marasil_core::list_profiles() {
            Ok(profiles) if profiles.is_empty() => Ok(CallToolResult::success(vec![Content::text(
                "No carrier profiles found. Use set_carrier to add one.",
            )])),
            Ok(profiles) => json_result(&profiles),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(description = "Get the stored profile for one carrier")]
    fn get_carrier(
        &self,
        Parameters(req): Parameters<CarrierRequest>,
    ) -> Result<CallToolResult, McpError> {
        let carrier = Carrier::from(req.carrier.as_str());
        match marasil_core::read_profile(&carrier) {
            Ok(Some(profile)) => json_result(&profile),
            Ok(None) => Ok(CallToolResult::error(vec![Content::text(format!(
                "No profile stored for carrier '{}'",
                carrier
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(
        description = "Create or replace a carrier profile. Catalog carriers need at least one allowed box size; box labels must be unique and every dimension positive."
    )]
    fn set_carrier(
        &self,
        Parameters(req): Parameters<SetCarrierRequest>,
    ) -> Result<CallToolResult, McpError> {
        let profile = profile_from_request(req);
        let carrier = profile.carrier.clone();
        match marasil_core::upsert_profile(profile) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Saved profile for carrier '{}'",
                carrier
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(description = "Delete the stored profile for a carrier")]
    fn delete_carrier(
        &self,
        Parameters(req): Parameters<CarrierRequest>,
    ) -> Result<CallToolResult, McpError> {
        let carrier = Carrier::from(req.carrier.as_str());
        match marasil_core::delete_profile(&carrier) {
            Ok(true) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Deleted profile for carrier '{}'",
                carrier
            ))])),
            Ok(false) => Ok(CallToolResult::success(vec![Content::text(format!(
                "No profile stored for carrier '{}'",
                carrier
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(
        description = "Split a chat assistant reply into display text and its JSON action block. Returns {text, action?, shipmentCheck?}; shipmentCheck is the dimension check for createShipment actions."
    )]
    fn parse_assistant_reply(
        &self,
        Parameters(req): Parameters<ParseReplyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reply = parse_reply(&req.reply);
        let shipment_check = if reply.action.is_some() {
            reply.check_shipment(&stored_profiles())
        } else {
            None
        };
        json_result(&ParsedReply {
            reply,
            shipment_check,
        })
    }

    #[tool(
        description = "Build the system prompt and user message for the chat assistant, including the configured carriers"
    )]
    fn get_assistant_prompt(
        &self,
        Parameters(req): Parameters<AssistantPromptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let profiles = stored_profiles();
        Ok(CallToolResult::success(vec![
            Content::text(prompt::system_prompt()),
            Content::text(prompt::user_message(&req.question, &profiles)),
        ]))
    }

    #[tool(description = "Get the carrier packaging rules")]
    fn get_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            marasil_core::rules::RULES,
        )]))
    }
}

#[tool_handler]
impl ServerHandler for MarasilServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "{}\n\n## Packaging Rules\n{}",
            INSTRUCTIONS,
            marasil_core::rules::RULES
        );
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

/// Validate with explicit constraints, or the stored profile when the request carries none.
fn resolve_validation(
    req: &ValidateDimensionsRequest,
    stored: impl FnOnce(&Carrier) -> CoreResult<Option<CarrierProfile>>,
) -> CoreResult<ValidationResult> {
    let carrier = Carrier::from(req.carrier.as_str());
    let dimensions = PackageDimensions {
        length: req.length,
        width: req.width,
        height: req.height,
    };

    if req.allowed_box_sizes.is_none() && req.max_box_dimensions.is_none() {
        return Ok(match stored(&carrier)? {
            Some(profile) => profile.validate(&dimensions),
            None => validate_dimensions(&carrier, &dimensions, None, None),
        });
    }

    Ok(validate_dimensions(
        &carrier,
        &dimensions,
        req.allowed_box_sizes.as_deref(),
        req.max_box_dimensions.as_ref(),
    ))
}

fn profile_from_request(req: SetCarrierRequest) -> CarrierProfile {
    CarrierProfile {
        carrier: Carrier::from(req.carrier),
        allowed_box_sizes: req.allowed_box_sizes.unwrap_or_default(),
        max_box_dimensions: req.max_box_dimensions,
    }
}

fn stored_profiles() -> Vec<CarrierProfile> {
    marasil_core::list_profiles().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "carrier profiles unavailable, continuing without them");
        vec![]
    })
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

const INSTRUCTIONS: &str = r#"Marasil carrier tools. Use these before submitting a shipment to the Marasil backend.

## Workflow
1. `list_carriers` to see which carriers have stored box catalogs or maximum dimensions.
2. `validate_dimensions` with the carrier and the package's length, width and height (cm). Only pass allowed_box_sizes or max_box_dimensions to override the stored profile.
3. If the result is invalid, show the `error` text to the merchant verbatim and do not submit the shipment.
4. For chat replies, call `parse_assistant_reply` and act on `action` only when `shipmentCheck` is absent or valid."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(data_dir = %marasil_core::data_dir().display(), "starting marasil-mcp");

    let service = MarasilServer::new()
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}
