use serde_json::Value;

use crate::constants::LABEL_SELECTOR_KEY_PREFIX;

/// Splits a `key -> value` selector map into `(field_selector, label_selector)` query strings,
/// per spec §3: keys prefixed `metadata.labels.` become label selectors (prefix stripped), all
/// other keys become field selectors. No trailing comma is emitted.
pub fn partition_selectors(selectors: &std::collections::BTreeMap<String, Value>) -> (String, String) {
    let mut field_parts = Vec::new();
    let mut label_parts = Vec::new();

    for (key, value) in selectors {
        let rendered = render_value(value);
        if let Some(label_key) = key.strip_prefix(LABEL_SELECTOR_KEY_PREFIX) {
            label_parts.push(format!("{label_key}={rendered}"));
        } else {
            field_parts.push(format!("{key}={rendered}"));
        }
    }

    (field_parts.join(","), label_parts.join(","))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
