/// Carrier packaging rules. Single source of truth for assistant prompts and MCP instructions.
pub const RULES: &str = "\
1. Every shipment needs length, width and height in centimeters. A missing, zero or negative \
value means the package is not ready to ship; ask for the measurement instead of guessing.\n\
2. Catalog carriers (redbox, omniclama) only take their published box sizes. A package is \
accepted when its volume (length × width × height) is no larger than the volume of at least one \
published box. The check compares volumes only, so a long flat parcel can pass against a compact \
box of equal volume.\n\
3. A catalog carrier with no published box sizes cannot accept anything. Report the missing \
configuration rather than approving the shipment.\n\
4. Bounding-box carriers (smsa, aramex) accept any package whose length, width and height each \
stay within the carrier's maximum. Values equal to the maximum are accepted. When the carrier \
publishes no maximum, 50 × 50 × 40 cm applies.\n\
5. Any other carrier has no size rule here. Accept the package once all three dimensions are present.\n\
6. When a package is rejected, quote the reason verbatim: it lists the allowed box sizes or the \
maximum that was exceeded, which is what the merchant needs to repack.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAX_BOX;

    #[test]
    fn default_bounds_in_rules_match_constant() {
        let expected = format!(
            "{} × {} × {} cm",
            DEFAULT_MAX_BOX.length, DEFAULT_MAX_BOX.width, DEFAULT_MAX_BOX.height
        );
        assert!(RULES.contains(&expected));
    }

    #[test]
    fn rules_name_every_known_carrier() {
        for carrier in crate::Carrier::KNOWN {
            assert!(RULES.contains(carrier.tag()), "{} missing", carrier);
        }
    }
}
