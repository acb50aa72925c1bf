//! The `.doc-config.json` document.
//!
//! The raw JSON is shaped into a [`ConfigTree`] whose values are either a
//! branch or a scalar leaf. Lists are rejected up front instead of being
//! stringified into CSS.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::error::{BuildError, ConfigError};

/// Key/value pairs in the order they appear in the source file.
pub type ConfigMap = Vec<(String, ConfigValue)>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Branch(ConfigMap),
    Leaf(Scalar),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            // Floats print like `1000`, not `1000.0`.
            Self::Number(n) => match n.as_f64() {
                Some(v) if n.is_f64() => write!(f, "{}", v),
                _ => write!(f, "{}", n),
            },
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Document-wide settings plus per-page overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    pub global: ConfigMap,
    pub pages: Vec<(String, ConfigMap)>,
}

impl ConfigTree {
    pub async fn load(path: &Path) -> Result<Self, BuildError> {
        let raw = read_json(path).await?;
        Ok(Self::from_json(&raw)?)
    }

    pub fn from_json(raw: &Value) -> Result<Self, ConfigError> {
        let root = raw.as_object().ok_or_else(|| ConfigError::NotAMapping {
            path: "<root>".to_string(),
        })?;

        let global = match root.get("global") {
            None | Some(Value::Null) => ConfigMap::new(),
            Some(value) => to_map(value, "global")?,
        };

        let pages = match root.get("pages") {
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(id, value)| Ok((id.clone(), to_map(value, &format!("pages.{}", id))?)))
                .collect::<Result<Vec<_>, ConfigError>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(ConfigError::NotAMapping {
                    path: "pages".to_string(),
                })
            }
        };

        Ok(Self { global, pages })
    }
}

fn to_map(value: &Value, path: &str) -> Result<ConfigMap, ConfigError> {
    match value {
        Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| {
                let child = format!("{}.{}", path, key);
                Ok((key.clone(), to_value(value, &child)?))
            })
            .collect(),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_string(),
        }),
    }
}

fn to_value(value: &Value, path: &str) -> Result<ConfigValue, ConfigError> {
    let scalar = match value {
        Value::Object(_) => return Ok(ConfigValue::Branch(to_map(value, path)?)),
        Value::Array(_) => {
            return Err(ConfigError::SequenceLeaf {
                path: path.to_string(),
            })
        }
        Value::String(s) => Scalar::String(s.clone()),
        Value::Number(n) => Scalar::Number(n.clone()),
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Null => Scalar::Null,
    };
    Ok(ConfigValue::Leaf(scalar))
}

pub async fn read_json(path: &Path) -> Result<Value, BuildError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::io("read config", path, e))?;
    let raw = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(raw)
}

/// Writes `raw` back as two-space indented JSON.
pub async fn save_json(path: &Path, raw: &Value) -> Result<(), BuildError> {
    let mut text = serde_json::to_string_pretty(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    fs::write(path, text)
        .await
        .map_err(|e| BuildError::io("write config", path, e))
}

/// Reads a dotted key such as `global.page.size`.
pub fn get_path<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(raw, |current, segment| current.get(segment))
}

/// Sets a dotted key, creating missing objects along the way. `input` is
/// parsed as JSON when possible and stored as a plain string otherwise.
pub fn set_path(raw: &mut Value, key: &str, input: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::EmptyKey);
    }
    let value = serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()));

    let mut segments: Vec<&str> = key.split('.').collect();
    let last = segments.pop().ok_or(ConfigError::EmptyKey)?;

    let mut current = raw;
    let mut walked = String::new();
    for segment in segments {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);

        let map = current.as_object_mut().ok_or_else(|| ConfigError::NotAMapping {
            path: parent_of(&walked),
        })?;
        let child = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if child.is_null() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }

    let map = current.as_object_mut().ok_or_else(|| ConfigError::NotAMapping {
        path: if walked.is_empty() { "<root>".to_string() } else { walked.clone() },
    })?;
    map.insert(last.to_string(), value);
    Ok(())
}

fn parent_of(path: &str) -> String {
    match path.rsplit_once('.') {
        Some((parent, _)) => parent.to_string(),
        None => "<root>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_source_key_order() {
        let raw: Value = serde_json::from_str(
            r#"{"global": {"zeta": "1", "alpha": {"b": 2, "a": true}}, "pages": {"02": {}, "01": {}}}"#,
        )
        .unwrap();
        let tree = ConfigTree::from_json(&raw).unwrap();

        let keys: Vec<_> = tree.global.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        let pages: Vec<_> = tree.pages.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(pages, vec!["02", "01"]);
    }

    #[test]
    fn missing_sections_are_empty() {
        let tree = ConfigTree::from_json(&json!({})).unwrap();
        assert!(tree.global.is_empty());
        assert!(tree.pages.is_empty());

        let tree = ConfigTree::from_json(&json!({"global": null, "pages": null})).unwrap();
        assert_eq!(tree, ConfigTree::default());
    }

    #[test]
    fn rejects_lists_in_leaf_position() {
        let err = ConfigTree::from_json(&json!({"pages": {"01": {"fonts": ["a", "b"]}}})).unwrap_err();
        assert!(matches!(err, ConfigError::SequenceLeaf { path } if path == "pages.01.fonts"));
    }

    #[test]
    fn rejects_non_object_sections() {
        assert!(matches!(
            ConfigTree::from_json(&json!({"global": "x"})),
            Err(ConfigError::NotAMapping { .. })
        ));
        assert!(matches!(
            ConfigTree::from_json(&json!({"pages": {"01": 3}})),
            Err(ConfigError::NotAMapping { path }) if path == "pages.01"
        ));
    }

    #[test]
    fn scalars_render_as_text() {
        assert_eq!(Scalar::Number(serde_json::Number::from_f64(1.6).unwrap()).to_string(), "1.6");
        assert_eq!(Scalar::Number(12.into()).to_string(), "12");
        assert_eq!(Scalar::Number(serde_json::Number::from_f64(1.0).unwrap()).to_string(), "1");
        assert_eq!(Scalar::Number(serde_json::Number::from_f64(-2.5).unwrap()).to_string(), "-2.5");
        assert_eq!(Scalar::Bool(false).to_string(), "false");
        assert_eq!(Scalar::Null.to_string(), "null");
    }

    #[test]
    fn integral_floats_from_json_lose_the_fraction() {
        let raw: Value = serde_json::from_str(r#"{"global": {"zIndex": 1.0, "width": 1e3}}"#).unwrap();
        let tree = ConfigTree::from_json(&raw).unwrap();
        let rendered: Vec<_> = tree
            .global
            .iter()
            .map(|(_, v)| match v {
                ConfigValue::Leaf(s) => s.to_string(),
                ConfigValue::Branch(_) => unreachable!(),
            })
            .collect();
        assert_eq!(rendered, vec!["1", "1000"]);
    }

    #[test]
    fn gets_and_sets_dotted_keys() {
        let mut raw = json!({"global": {"page": {"size": "A4"}}});
        assert_eq!(get_path(&raw, "global.page.size"), Some(&json!("A4")));
        assert_eq!(get_path(&raw, "global.nope"), None);

        set_path(&mut raw, "global.page.size", "Letter").unwrap();
        set_path(&mut raw, "global.typography.lineHeight", "1.5").unwrap();
        set_path(&mut raw, "global.flags", r#"{"draft": true}"#).unwrap();

        assert_eq!(get_path(&raw, "global.page.size"), Some(&json!("Letter")));
        assert_eq!(get_path(&raw, "global.typography.lineHeight"), Some(&json!(1.5)));
        assert_eq!(get_path(&raw, "global.flags.draft"), Some(&json!(true)));
    }

    #[test]
    fn refuses_to_set_below_a_scalar() {
        let mut raw = json!({"global": {"page": "A4"}});
        let err = set_path(&mut raw, "global.page.size", "A3").unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { path } if path == "global.page"));
    }
}
