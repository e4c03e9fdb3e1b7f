use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{AssistantAction, AssistantReply};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fenced block pattern")
});

/// Canonical tag for each action the dashboard knows, keyed by the name
/// lowercased with `_` and `-` removed.
const KNOWN_ACTIONS: &[(&str, &str)] = &[
    ("createshipment", "createShipment"),
    ("trackshipment", "trackShipment"),
    ("cancelshipment", "cancelShipment"),
    ("navigate", "navigate"),
];

/// Split a raw assistant reply into display text and its action block.
/// Never fails: a malformed block leaves the text untouched and no action
/// (graceful degradation).
pub fn parse_reply(raw: &str) -> AssistantReply {
    let untouched = || AssistantReply {
        text: raw.trim().to_string(),
        action: None,
    };

    let Some((span, value)) = find_action_block(raw) else {
        return untouched();
    };

    let Some(action) = to_action(value) else {
        return untouched();
    };

    AssistantReply {
        text: splice_out(raw, span),
        action: Some(action),
    }
}

/// Remove `span` from `raw`, collapsing the whitespace around it to a single
/// paragraph break (or a space when the block sat inside a line).
fn splice_out(raw: &str, span: Range<usize>) -> String {
    let before = &raw[..span.start];
    let after = &raw[span.end..];
    let head = before.trim_end();
    let tail = after.trim_start();

    let gap = &before[head.len()..];
    let lead = &after[..after.len() - tail.len()];
    let sep = if gap.contains('\n') || lead.contains('\n') {
        "\n\n"
    } else {
        " "
    };

    match (head.trim_start(), tail.trim_end()) {
        ("", tail) => tail.to_string(),
        (head, "") => head.to_string(),
        (head, tail) => format!("{head}{sep}{tail}"),
    }
}

/// Locate the first JSON object carrying an `action` key, preferring fenced
/// code blocks over bare objects in the prose.
fn find_action_block(raw: &str) -> Option<(Range<usize>, Value)> {
    for caps in FENCED_BLOCK.captures_iter(raw) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if let Some(value) = action_object(inner.as_str().trim()) {
            return Some((whole.range(), value));
        }
    }

    balanced_objects(raw)
        .into_iter()
        .find_map(|span| action_object(&raw[span.clone()]).map(|v| (span, v)))
}

fn action_object(candidate: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    value.get("action")?.as_str()?;
    Some(value)
}

/// Byte ranges of balanced `{...}` spans, one per opening brace, ignoring
/// braces inside strings. Every `{` is tried as a start so that a stray brace
/// in the prose cannot hide an object that follows it.
fn balanced_objects(raw: &str) -> Vec<Range<usize>> {
    raw.char_indices()
        .filter(|&(_, ch)| ch == '{')
        .filter_map(|(start, _)| closing_brace(raw, start).map(|end| start..end + 1))
        .collect()
}

/// Index of the `}` that closes the object opened at `start`.
fn closing_brace(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }

    None
}

fn to_action(mut value: Value) -> Option<AssistantAction> {
    let name = value.get("action")?.as_str()?.to_string();
    let normalized = name.replace(['_', '-'], "").to_ascii_lowercase();
    let Some(&(_, canonical)) = KNOWN_ACTIONS.iter().find(|(key, _)| *key == normalized) else {
        return Some(AssistantAction::Unknown { name });
    };

    value["action"] = Value::from(canonical);
    match serde_json::from_value::<AssistantAction>(value) {
        Ok(action) => Some(action),
        Err(e) => {
            tracing::debug!(action = %name, error = %e, "dropping malformed action block");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marasil_core::Carrier;

    #[test]
    fn fenced_block_is_extracted_and_removed() {
        let raw = "Sure, I'll create that shipment.\n\n```json\n{\"action\": \"createShipment\", \"carrier\": \"aramex\", \"length\": 30, \"width\": 20, \"height\": 10}\n```\n\nAnything else?";
        let reply = parse_reply(raw);
        assert_eq!(
            reply.text,
            "Sure, I'll create that shipment.\n\nAnything else?"
        );
        match reply.action.unwrap() {
            AssistantAction::CreateShipment {
                carrier,
                length,
                height,
                weight,
                ..
            } => {
                assert_eq!(carrier, Carrier::Aramex);
                assert_eq!(length, Some(30.0));
                assert_eq!(height, Some(10.0));
                assert_eq!(weight, None);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn bare_object_is_extracted() {
        let raw = r#"Tracking it now {"action":"trackShipment","trackingNumber":"MR-1{2}"}"#;
        let reply = parse_reply(raw);
        assert_eq!(reply.text, "Tracking it now");
        assert_eq!(
            reply.action,
            Some(AssistantAction::TrackShipment {
                tracking_number: "MR-1{2}".to_string()
            })
        );
    }

    #[test]
    fn objects_without_action_are_skipped() {
        let raw = r#"Example payload {"carrier":"smsa"} then {"action":"navigate","path":"/returns"}"#;
        let reply = parse_reply(raw);
        assert_eq!(
            reply.action,
            Some(AssistantAction::Navigate {
                path: "/returns".to_string()
            })
        );
        assert_eq!(reply.text, r#"Example payload {"carrier":"smsa"} then"#);
    }

    #[test]
    fn plain_text_has_no_action() {
        let reply = parse_reply("  Your shipment is on its way.  ");
        assert_eq!(reply.text, "Your shipment is on its way.");
        assert!(reply.action.is_none());
    }

    #[test]
    fn malformed_block_leaves_text_untouched() {
        let raw = "Here you go ```json\n{\"action\": \"navigate\", \"path\": }\n```";
        let reply = parse_reply(raw);
        assert_eq!(reply.text, raw);
        assert!(reply.action.is_none());
    }

    #[test]
    fn known_action_with_missing_fields_is_dropped() {
        let raw = r#"{"action":"trackShipment"}"#;
        let reply = parse_reply(raw);
        assert!(reply.action.is_none());
        assert_eq!(reply.text, raw);
    }

    #[test]
    fn unknown_action_is_reported_by_name() {
        let reply = parse_reply(r#"{"action":"printLabel","id":4}"#);
        assert_eq!(
            reply.action,
            Some(AssistantAction::Unknown {
                name: "printLabel".to_string()
            })
        );
        assert_eq!(reply.text, "");
    }

    #[test]
    fn stray_brace_does_not_hide_later_action() {
        let reply = parse_reply(r#"Use the {placeholder form. {"action":"navigate","path":"/orders"}"#);
        assert_eq!(
            reply.action,
            Some(AssistantAction::Navigate {
                path: "/orders".to_string()
            })
        );
        assert_eq!(reply.text, "Use the {placeholder form.");
    }

    #[test]
    fn action_names_are_matched_loosely() {
        let raw = r#"{"action":"CreateShipment","carrier":"smsa","length":10,"width":10,"height":10}"#;
        let reply = parse_reply(raw);
        assert!(matches!(
            reply.action,
            Some(AssistantAction::CreateShipment {
                carrier: Carrier::Smsa,
                ..
            })
        ));

        let reply = parse_reply(r#"{"action":"create-shipment","carrier":"redbox","length":5,"width":5,"height":5}"#);
        assert_eq!(
            reply.action.and_then(|a| a.dimensions()),
            Some(marasil_core::PackageDimensions::new(5.0, 5.0, 5.0))
        );

        let reply = parse_reply(r#"{"action":"TRACK_SHIPMENT","trackingNumber":"MR7"}"#);
        assert_eq!(
            reply.action,
            Some(AssistantAction::TrackShipment {
                tracking_number: "MR7".to_string()
            })
        );
    }

    #[test]
    fn literal_unknown_action_is_not_a_passthrough() {
        let reply = parse_reply(r#"{"action":"unknown","name":"printLabel"}"#);
        assert_eq!(
            reply.action,
            Some(AssistantAction::Unknown {
                name: "unknown".to_string()
            })
        );
    }

    #[test]
    fn inline_block_keeps_sentence_spacing() {
        let reply = parse_reply(r#"Opening {"action":"navigate","path":"/invoices"} for you."#);
        assert_eq!(reply.text, "Opening for you.");
    }

    #[test]
    fn unterminated_object_is_ignored() {
        let reply = parse_reply(r#"Oops {"action":"navigate","path":"/x""#);
        assert!(reply.action.is_none());
    }
}
