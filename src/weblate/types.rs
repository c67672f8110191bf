use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{AssistError, Result};

/// Weblate state code for "translated".
pub const STATE_TRANSLATED: u8 = 20;

pub const QUERY_UNTRANSLATED: &str = "state:untranslated";
pub const QUERY_NOT_TRANSLATED: &str = "state:<translated";
pub const QUERY_TRANSLATED: &str = "state:translated";

/// One page of `GET /translations/{project}/{component}/{language}/units/`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitListPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<RawUnit>,
}

/// Unit as it arrives on the wire, before shape checks.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUnit {
    pub id: u64,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub target: Option<Vec<String>>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Validated unit record handed to the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub id: u64,
    pub source: Vec<String>,
    pub target: Vec<String>,
    pub context: String,
}

impl TryFrom<RawUnit> for UnitRecord {
    type Error = AssistError;

    /// Rejects units without source text and forces `target` to the shape of `source`.
    fn try_from(raw: RawUnit) -> Result<Self> {
        if raw.source.is_empty() {
            return Err(AssistError::Remote {
                status: 200,
                body: format!("unit {} has no source strings", raw.id),
            });
        }

        let width = raw.source.len();
        let mut target = raw.target.unwrap_or_default();
        if !target.is_empty() && target.len() != width {
            warn!(
                "Unit {} has {} target strings for {} sources, normalizing",
                raw.id,
                target.len(),
                width
            );
        }
        target.resize(width, String::new());

        Ok(Self {
            id: raw.id,
            source: raw.source,
            target,
            context: raw.context.unwrap_or_default(),
        })
    }
}

/// Body of `PATCH /units/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct UnitPatch<'a> {
    pub target: &'a [String],
    pub state: u8,
}

impl<'a> UnitPatch<'a> {
    pub fn translated(target: &'a [String]) -> Self {
        Self {
            target,
            state: STATE_TRANSLATED,
        }
    }
}

/// Flatten a downloaded JSON translation file into `dotted.key -> text`.
///
/// Nested objects contribute their path segments joined by `.`; non-string
/// leaves other than arrays of strings are skipped.
pub fn flatten_catalogue(value: &Value) -> Result<BTreeMap<String, String>> {
    let Value::Object(root) = value else {
        return Err(AssistError::Remote {
            status: 200,
            body: "translation file is not a JSON object".to_string(),
        });
    };

    let mut out = BTreeMap::new();
    let mut stack: Vec<(String, &Value)> = root
        .iter()
        .map(|(key, value)| (key.clone(), value))
        .collect();

    while let Some((key, value)) = stack.pop() {
        match value {
            Value::String(text) => {
                out.insert(key, text.clone());
            }
            Value::Object(children) => {
                for (child, child_value) in children {
                    stack.push((format!("{}.{}", key, child), child_value));
                }
            }
            Value::Array(items) => {
                let texts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if texts.len() == items.len() && !texts.is_empty() {
                    out.insert(key, texts.join("\n"));
                }
            }
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_target_becomes_empty_strings() {
        let raw = RawUnit {
            id: 7,
            source: vec!["One file".to_string(), "{count} files".to_string()],
            target: None,
            context: None,
        };
        let unit = UnitRecord::try_from(raw).unwrap();
        assert_eq!(unit.target, vec![String::new(), String::new()]);
        assert_eq!(unit.context, "");
    }

    #[test]
    fn test_short_target_is_padded_to_source_width() {
        let raw = RawUnit {
            id: 8,
            source: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            target: Some(vec!["x".to_string()]),
            context: Some("menu".to_string()),
        };
        let unit = UnitRecord::try_from(raw).unwrap();
        assert_eq!(unit.target, vec!["x".to_string(), String::new(), String::new()]);
    }

    #[test]
    fn test_unit_without_source_is_rejected() {
        let raw = RawUnit {
            id: 9,
            source: vec![],
            target: None,
            context: None,
        };
        assert!(UnitRecord::try_from(raw).is_err());
    }

    #[test]
    fn test_unit_page_parses_weblate_payload() {
        let payload = json!({
            "count": 2,
            "next": "https://hosted.weblate.org/api/translations/p/c/fr/units/?page=2",
            "previous": null,
            "results": [
                {"id": 1, "source": ["Save"], "target": [""], "context": "toolbar", "url": "x"},
                {"id": 2, "source": ["Open"], "target": null, "context": ""}
            ]
        });
        let page: UnitListPage = serde_json::from_value(payload).unwrap();
        assert_eq!(page.count, Some(2));
        assert!(page.next.is_some());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].target, None);
    }

    #[test]
    fn test_patch_marks_unit_translated() {
        let target = vec!["Enregistrer".to_string()];
        let body = serde_json::to_value(UnitPatch::translated(&target)).unwrap();
        assert_eq!(body, json!({"target": ["Enregistrer"], "state": 20}));
    }

    #[test]
    fn test_flatten_nested_catalogue() {
        let file = json!({
            "boards": {
                "movingImagesToBoard": "Moving images to board",
                "menu": {"open": "Open"}
            },
            "common": {"ok": "OK"},
            "count": 3,
            "plural": ["one", "many"]
        });
        let flat = flatten_catalogue(&file).unwrap();
        assert_eq!(flat.get("boards.movingImagesToBoard").map(String::as_str), Some("Moving images to board"));
        assert_eq!(flat.get("boards.menu.open").map(String::as_str), Some("Open"));
        assert_eq!(flat.get("common.ok").map(String::as_str), Some("OK"));
        assert_eq!(flat.get("plural").map(String::as_str), Some("one\nmany"));
        assert!(!flat.contains_key("count"));
    }

    #[test]
    fn test_flatten_rejects_non_object() {
        assert!(flatten_catalogue(&json!(["a"])).is_err());
    }
}
