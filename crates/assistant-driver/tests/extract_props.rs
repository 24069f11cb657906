use assistant_driver::{IncrementalScanner, JsonExtractor};
use proptest::prelude::*;
use serde_json::{json, Value};

fn label() -> impl Strategy<Value = String> {
    // Braces, quotes and backslashes exercise string-aware balancing.
    "[a-zA-Z0-9 {}\"\\\\:,]{0,20}"
}

fn record() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec((0u32..100_000, label()), 1..8),
        prop::collection::vec(label(), 1..5),
    )
        .prop_map(|(comparisons, messages)| {
            json!({
                "comparisons": comparisons
                    .into_iter()
                    .map(|(usd, item)| json!({"usd": usd, "item": item}))
                    .collect::<Vec<_>>(),
                "lowUsageMessages": messages,
                "templates": {
                    "savingsComparison": "{item}",
                    "buffetMode": "{totalCost}",
                    "lowUsage": "{message}",
                    "highUsageDefault": "wow"
                },
                "thresholds": {"savingsComparisonMin": 12, "buffetModeMin": 0}
            })
        })
}

fn prose() -> impl Strategy<Value = String> {
    "[a-zA-Z .,!]{0,40}"
}

proptest! {
    #[test]
    fn bare_record_roundtrips(rec in record()) {
        let text = serde_json::to_string(&rec).unwrap();
        let got: Value = JsonExtractor::new().extract(&text).unwrap();
        prop_assert_eq!(got, rec);
    }

    #[test]
    fn fenced_record_roundtrips(rec in record(), tag in "(json|JSON|)") {
        let text = format!("```{tag}\n{}\n```", serde_json::to_string_pretty(&rec).unwrap());
        let got: Value = JsonExtractor::new().extract(&text).unwrap();
        prop_assert_eq!(got, rec);
    }

    #[test]
    fn prose_wrapped_record_roundtrips(rec in record(), before in prose(), after in prose()) {
        let text = format!("{before}\n{}\n{after}", serde_json::to_string(&rec).unwrap());
        let got: Value = JsonExtractor::new().extract(&text).unwrap();
        prop_assert_eq!(got, rec);
    }

    #[test]
    fn first_of_two_records_wins(first in record(), second in record()) {
        let text = format!(
            "{}\n\nAlternatively:\n{}",
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        let got: Value = JsonExtractor::new().extract(&text).unwrap();
        prop_assert_eq!(got, first);
    }

    #[test]
    fn extraction_is_idempotent(rec in record(), before in prose()) {
        let ex = JsonExtractor::new();
        let once: Value = ex.extract(&format!("{before} {}", serde_json::to_string(&rec).unwrap())).unwrap();
        let twice: Value = ex.extract(&serde_json::to_string(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn scanner_is_chunking_independent(rec in record(), split in 0usize..400) {
        let text = serde_json::to_string(&rec).unwrap();
        let mut at = split.min(text.len());
        while !text.is_char_boundary(at) {
            at -= 1;
        }
        let mut scanner = IncrementalScanner::new();
        let head: Option<Value> = scanner.push_for(&text[..at]);
        let got = head.or_else(|| scanner.push_for(&text[at..]));
        prop_assert_eq!(got, Some(rec));
    }
}

#[test]
fn nested_fences_return_embedded_record_exactly() {
    let inner = r#"{"comparisons":[{"usd":1,"item":"x"}],"lowUsageMessages":["y"],"templates":{"savingsComparison":"a","buffetMode":"b","lowUsage":"c","highUsageDefault":"d"},"thresholds":{"savingsComparisonMin":1,"buffetModeMin":0}}"#;
    let expected: Value = serde_json::from_str(inner).unwrap();
    let text = format!("```text\nSure, here:\n```json\n{inner}\n```\nThanks!```");
    let got: Value = JsonExtractor::new().extract(&text).unwrap();
    assert_eq!(got, expected);

    let plain = format!("Sure, here:\n```json\n{inner}\n```\nThanks!");
    let got: Value = JsonExtractor::new().extract(&plain).unwrap();
    assert_eq!(got, expected);
}
