//! System code (reference data) models.
//!
//! System codes are small lookup tables (regions, positions, article
//! categories...) grouped under a parent code id. The API has returned them
//! under several field spellings over time, so raw items are normalised into
//! `ReferenceCodeItem` before anything else sees them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parent ids loaded on login and on first page load.
pub const SYSCODE_PARENT_IDS: [&str; 7] = [
    "SYS26209B002", // article category
    "SYS26127B017", // signup region
    "SYS26127B018", // signup region, domestic
    "SYS26127B019", // signup region, foreign
    "SYS26127B006", // position
    "SYS26209B020", // article publish info
    "SYS26209B015", // article visibility
];

/// Domestic region list.
pub const REGION_DOMESTIC_PARENT: &str = "SYS26127B018";
/// Foreign region list.
pub const REGION_FOREIGN_PARENT: &str = "SYS26127B019";
/// Church position list.
pub const POSITION_PARENT: &str = "SYS26127B006";

/// Success marker the API puts in `IndeAPIResponse.ErrorCode`.
const API_OK_CODE: &str = "00";

/// A single child entry of a system code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ReferenceCodeItem {
    pub id: String,
    pub name: String,
    pub value: String,
    #[serde(rename = "sortOrder")]
    pub sort_order: i64,
    pub enabled: bool,
}

impl ReferenceCodeItem {
    /// Map one raw API item onto the normalised shape.
    ///
    /// Field precedence: `sysCodeVal`, then `sysCodeValue`, then `sysCodeSid`
    /// for the value; `sysCodeUse` before `sysCodeUseFlag` for the flag.
    pub fn from_raw(raw: &Value) -> Self {
        let id = text_field(raw, &["sysCodeSid"]).unwrap_or_default();
        let name = text_field(raw, &["sysCodeName"]).unwrap_or_default();
        let value = text_field(raw, &["sysCodeVal", "sysCodeValue", "sysCodeSid"]).unwrap_or_default();
        let sort_order = raw.get("sysCodeSort").map(sort_value).unwrap_or(0);
        let enabled = ["sysCodeUse", "sysCodeUseFlag"]
            .iter()
            .find_map(|key| present(raw, key))
            .map(flag_value)
            .unwrap_or(true);

        Self {
            id,
            name,
            value,
            sort_order,
            enabled,
        }
    }
}

/// Returns the field only when it holds something other than `null`.
fn present<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| present(raw, key)).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn sort_value(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn flag_value(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("Y") || s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// Pull the item list out of whichever envelope the server used.
///
/// Tried in order: `{IndeAPIResponse: {ErrorCode: "00", Result: [...]}}`,
/// a bare array, then `{results: [...]}`. Anything else yields no items.
pub fn parse_code_envelope(body: &Value) -> Vec<ReferenceCodeItem> {
    let list = if let Some(envelope) = body
        .get("IndeAPIResponse")
        .filter(|e| e.get("ErrorCode").and_then(Value::as_str) == Some(API_OK_CODE))
    {
        match envelope.get("Result") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        }
    } else if let Value::Array(items) = body {
        items.as_slice()
    } else if let Some(Value::Array(items)) = body.get("results") {
        items.as_slice()
    } else {
        return Vec::new();
    };

    list.iter().map(ReferenceCodeItem::from_raw).collect()
}

/// Items suitable for a dropdown: enabled only, ordered by `sort_order`.
///
/// The sort is stable, so equal sort orders keep their server order.
pub fn selectable_options(items: &[ReferenceCodeItem]) -> Vec<ReferenceCodeItem> {
    let mut options: Vec<ReferenceCodeItem> = items.iter().filter(|i| i.enabled).cloned().collect();
    options.sort_by_key(|i| i.sort_order);
    options
}

/// Resolve a stored code to its display name.
///
/// Matches on `id` first, then `value`; unknown codes are shown as-is.
pub fn display_name<'a>(items: &'a [ReferenceCodeItem], code: &'a str) -> &'a str {
    items
        .iter()
        .find(|i| i.id == code)
        .or_else(|| items.iter().find(|i| i.value == code))
        .map(|i| i.name.as_str())
        .unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, sort_order: i64, enabled: bool) -> ReferenceCodeItem {
        ReferenceCodeItem {
            id: id.to_string(),
            name: format!("name-{}", id),
            value: id.to_string(),
            sort_order,
            enabled,
        }
    }

    #[test]
    fn test_from_raw_defaults() {
        let raw = json!({"sysCodeSid": "A1", "sysCodeName": "목사", "sysCodeSort": 1, "sysCodeUse": "Y"});
        let parsed = ReferenceCodeItem::from_raw(&raw);
        assert_eq!(
            parsed,
            ReferenceCodeItem {
                id: "A1".to_string(),
                name: "목사".to_string(),
                value: "A1".to_string(),
                sort_order: 1,
                enabled: true,
            }
        );

        let bare = ReferenceCodeItem::from_raw(&json!({"sysCodeSid": "B2"}));
        assert_eq!(bare.value, "B2");
        assert_eq!(bare.sort_order, 0);
        assert!(bare.enabled);
        assert_eq!(bare.name, "");
    }

    #[test]
    fn test_from_raw_alternate_field_names() {
        let raw = json!({
            "sysCodeSid": "C3",
            "sysCodeName": "Seoul",
            "sysCodeValue": "SEOUL",
            "sysCodeSort": "7",
            "sysCodeUseFlag": "N"
        });
        let parsed = ReferenceCodeItem::from_raw(&raw);
        assert_eq!(parsed.value, "SEOUL");
        assert_eq!(parsed.sort_order, 7);
        assert!(!parsed.enabled);

        // sysCodeVal wins over sysCodeValue, sysCodeUse over sysCodeUseFlag
        let raw = json!({
            "sysCodeSid": 42,
            "sysCodeVal": "v",
            "sysCodeValue": "ignored",
            "sysCodeUse": "Y",
            "sysCodeUseFlag": "N",
            "sysCodeSort": null
        });
        let parsed = ReferenceCodeItem::from_raw(&raw);
        assert_eq!(parsed.id, "42");
        assert_eq!(parsed.value, "v");
        assert!(parsed.enabled);
        assert_eq!(parsed.sort_order, 0);
    }

    #[test]
    fn test_parse_envelopes() {
        let array = json!([{"sysCodeSid": "A"}]);
        assert_eq!(parse_code_envelope(&array).len(), 1);

        let results = json!({"results": [{"sysCodeSid": "A"}, {"sysCodeSid": "B"}]});
        assert_eq!(parse_code_envelope(&results).len(), 2);

        let inde = json!({"IndeAPIResponse": {"ErrorCode": "00", "Result": [{"sysCodeSid": "A"}]}});
        assert_eq!(parse_code_envelope(&inde)[0].id, "A");

        let inde_empty = json!({"IndeAPIResponse": {"ErrorCode": "00"}});
        assert!(parse_code_envelope(&inde_empty).is_empty());

        let inde_error = json!({"IndeAPIResponse": {"ErrorCode": "99", "Result": [{"sysCodeSid": "A"}]}});
        assert!(parse_code_envelope(&inde_error).is_empty());

        assert!(parse_code_envelope(&json!({"detail": "nope"})).is_empty());
        assert!(parse_code_envelope(&json!("text")).is_empty());
    }

    #[test]
    fn test_selectable_options_sorts_and_filters() {
        let items = vec![item("c", 3, true), item("a", 1, true), item("x", 0, false), item("b", 1, true)];
        let ids: Vec<String> = selectable_options(&items).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display_name_lookup() {
        let mut by_value = item("S1", 0, true);
        by_value.value = "SEOUL".to_string();
        by_value.name = "서울".to_string();
        let items = vec![item("A1", 0, true), by_value];

        assert_eq!(display_name(&items, "A1"), "name-A1");
        assert_eq!(display_name(&items, "SEOUL"), "서울");
        assert_eq!(display_name(&items, "UNKNOWN"), "UNKNOWN");
    }
}
