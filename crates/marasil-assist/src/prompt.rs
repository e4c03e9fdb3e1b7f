use marasil_core::{CarrierProfile, CarrierRule, DEFAULT_MAX_BOX};

fn rule_str(rule: CarrierRule) -> &'static str {
    match rule {
        CarrierRule::Catalog => "catalog",
        CarrierRule::BoundingBox => "bounding box",
        CarrierRule::Unconstrained => "no size rule",
    }
}

/// Compact text listing of configured carriers for the chat context.
pub fn carrier_summary(profiles: &[CarrierProfile]) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("CARRIERS:\n");
    if profiles.is_empty() {
        out.push_str("  (none configured)\n");
        return out;
    }

    for profile in profiles {
        let rule = profile.carrier.rule();
        out.push_str("- ");
        out.push_str(profile.carrier.tag());
        out.push_str(" (");
        out.push_str(rule_str(rule));
        out.push(')');

        match rule {
            CarrierRule::Catalog if profile.allowed_box_sizes.is_empty() => {
                out.push_str(": no box sizes published");
            }
            CarrierRule::Catalog => {
                out.push_str(": ");
                let sizes: Vec<String> = profile
                    .allowed_box_sizes
                    .iter()
                    .map(|o| o.to_string())
                    .collect();
                out.push_str(&sizes.join(", "));
            }
            CarrierRule::BoundingBox => {
                out.push_str(": max ");
                match &profile.max_box_dimensions {
                    Some(max) => out.push_str(&format!("{max} cm")),
                    None => out.push_str(&format!("{DEFAULT_MAX_BOX} cm (default)")),
                }
            }
            CarrierRule::Unconstrained => {}
        }
        out.push('\n');
    }

    out
}

pub fn system_prompt() -> String {
    format!(
        "You are the Marasil shipping assistant. You help merchants create and follow up on \
shipments, orders and returns from the Marasil dashboard.\n\n\
Answer in plain, short sentences. When the merchant asks you to do something the dashboard \
can do, add exactly ONE action block after your answer, as a fenced ```json code block \
containing a single object with an \"action\" field.\n\n\
Available actions:\n\
- {{\"action\":\"createShipment\",\"carrier\":\"<carrier tag>\",\"length\":<cm>,\"width\":<cm>,\
\"height\":<cm>,\"weight\":<kg>,\"description\":\"<contents>\"}}\n\
- {{\"action\":\"trackShipment\",\"trackingNumber\":\"<tracking number>\"}}\n\
- {{\"action\":\"cancelShipment\",\"trackingNumber\":\"<tracking number>\"}}\n\
- {{\"action\":\"navigate\",\"path\":\"<dashboard path, e.g. /orders>\"}}\n\n\
Do NOT:\n\
- Invent tracking numbers, carriers or measurements the merchant did not give you\n\
- Emit more than one action block\n\
- Emit an action block for questions that only need an answer\n\n\
## Packaging Rules\n{}",
        marasil_core::rules::RULES
    )
}

pub fn user_message(question: &str, profiles: &[CarrierProfile]) -> String {
    let mut out = carrier_summary(profiles);
    out.push('\n');
    out.push_str("QUESTION:\n");
    out.push_str(question.trim());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marasil_core::{BoxSizeOption, Carrier, MaxBoxDimensions};

    #[test]
    fn summary_describes_each_rule() {
        let profiles = vec![
            CarrierProfile::new(Carrier::Aramex),
            CarrierProfile::new(Carrier::Redbox)
                .with_box_sizes(vec![BoxSizeOption::new("S", 20.0, 20.0, 20.0)]),
            CarrierProfile::new(Carrier::Smsa).with_max_box(MaxBoxDimensions::new(60.0, 60.0, 50.0)),
            CarrierProfile::new(Carrier::from("naqel")),
        ];
        let summary = carrier_summary(&profiles);
        assert_eq!(
            summary,
            "CARRIERS:\n\
             - aramex (bounding box): max 50×50×40 cm (default)\n\
             - redbox (catalog): S (20×20×20)\n\
             - smsa (bounding box): max 60×60×50 cm\n\
             - naqel (no size rule)\n"
        );
    }

    #[test]
    fn empty_summary() {
        assert_eq!(carrier_summary(&[]), "CARRIERS:\n  (none configured)\n");
    }

    #[test]
    fn system_prompt_lists_actions_and_rules() {
        let prompt = system_prompt();
        for action in ["createShipment", "trackShipment", "cancelShipment", "navigate"] {
            assert!(prompt.contains(action), "{action} missing");
        }
        assert!(prompt.contains(marasil_core::rules::RULES));
    }

    #[test]
    fn user_message_puts_carriers_before_question() {
        let msg = user_message("  Ship this 30x20x10 box with aramex ", &[]);
        assert!(msg.starts_with("CARRIERS:"));
        assert!(msg.ends_with("QUESTION:\nShip this 30x20x10 box with aramex"));
    }
}
