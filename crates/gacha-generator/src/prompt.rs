//! Instruction text sent to assistant CLIs.

use gacha_core::{Category, GenerationRequest, Rarity};

/// Number of low-usage messages asked for.
pub const LOW_USAGE_MESSAGE_COUNT: usize = 7;

/// Build the variant-neutral instruction for `request`.
///
/// The embedded shape mirrors the wire format of `ContentRecord` so the
/// answer can be deserialized directly.
pub fn build_instruction(request: &GenerationRequest) -> String {
    let GenerationRequest { category, rarity } = *request;
    let range = rarity.price_range();
    let shape = format!(
        r#"Generate a JSON object comparing a month of Claude usage cost with things money can buy.
Output only the JSON object. No explanations and no extra text.

Category: {category_name} ({category_description})
Rarity: {rarity_name} ({stars})

Shape:
{{
  "comparisons": [
    {{ "usd": <number>, "item": "<product or service>" }}
    // at least {min_items} entries, priced between ${min_usd} and ${max_usd}
  ],
  "lowUsageMessages": [
    "<a humorous line for a light-usage month>"
    // {LOW_USAGE_MESSAGE_COUNT} entries, themed around {category_name}
  ],
  "templates": {{
    "savingsComparison": "This month you saved about {{item}} (total: {{totalCost}}, saved: {{savings}})",
    "buffetMode": "All-you-can-eat Claude Max ({{totalCost}})",
    "lowUsage": "{{message}} ({{totalCost}})",
    "highUsageDefault": "{high_usage}"
  }},
  "thresholds": {{
    "savingsComparisonMin": 12,
    "buffetModeMin": 0
  }}
}}
"#,
        category_name = category.display_name(),
        category_description = category.description(),
        rarity_name = rarity.display_name(),
        stars = rarity.stars(),
        min_items = rarity.min_item_count(),
        min_usd = range.min,
        max_usd = range.max,
        high_usage = rarity.high_usage_message(),
    );
    shape + &directives(category, rarity)
}

/// Category hints and tier-driven style directives appended to every
/// instruction. Empty when there is nothing to add.
pub fn directives(category: Category, rarity: Rarity) -> String {
    let mut lines: Vec<&str> = Vec::new();
    match category {
        Category::Tech => {
            lines.push("Focus on real developer tools and SaaS products.");
            lines.push("Always include Claude Max ($200).");
        }
        Category::Gadget => {
            lines.push("Include real gadgets and electronics.");
            lines.push("Include Apple products, PC parts and cameras.");
        }
        Category::Food | Category::Entertainment | Category::Life => {}
    }
    if rarity.is_high_tier() {
        lines.push("Mix in more playful and unusual items.");
        lines.push("Some items may be fictional, as long as they are fun.");
    }

    if lines.is_empty() {
        return String::new();
    }
    let bullets: String = lines.iter().map(|line| format!("- {line}\n")).collect();
    format!("\nImportant:\n{bullets}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_carries_rarity_parameters() {
        let text = build_instruction(&GenerationRequest::new(Category::Food, Rarity::UR));
        assert!(text.contains("at least 40 entries"));
        assert!(text.contains("between $10 and $50000"));
        assert!(text.contains(Rarity::UR.high_usage_message()));
        assert!(text.contains(Category::Food.description()));
    }

    #[test]
    fn shape_names_every_required_key() {
        let text = build_instruction(&GenerationRequest::new(Category::Life, Rarity::N));
        for key in [
            "\"comparisons\"",
            "\"lowUsageMessages\"",
            "\"savingsComparison\"",
            "\"buffetMode\"",
            "\"lowUsage\"",
            "\"highUsageDefault\"",
            "\"savingsComparisonMin\"",
            "\"buffetModeMin\"",
        ] {
            assert!(text.contains(key), "missing {key}");
        }
        assert!(text.contains("{totalCost}"));
    }

    #[test]
    fn tech_asks_for_claude_max() {
        let d = directives(Category::Tech, Rarity::N);
        assert!(d.contains("Claude Max"));
        assert!(!d.contains("fictional"));
    }

    #[test]
    fn plain_low_tier_has_no_empty_directive_header() {
        assert!(directives(Category::Food, Rarity::N).is_empty());
        let text = build_instruction(&GenerationRequest::new(Category::Life, Rarity::R));
        assert!(!text.contains("Important:"));
        assert!(text.trim_end().ends_with('}'));
    }

    #[test]
    fn high_tiers_ask_for_fictional_items() {
        for rarity in [Rarity::SR, Rarity::UR, Rarity::LR] {
            assert!(directives(Category::Food, rarity).contains("fictional"));
        }
        assert!(!directives(Category::Food, Rarity::R).contains("fictional"));
    }
}
