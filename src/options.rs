use serde_json::{Map, Value};

use crate::foundation::error::{LatexError, LatexResult};

/// Rendering options passed verbatim to the typesetting engine.
///
/// The map is opaque to this crate and is never validated beyond being a JSON object. Keys keep
/// their insertion order and nothing is normalized: `{"em":16,"ex":8}` and `{"ex":8,"em":16}`,
/// or `1` and `1.0`, are distinct options as far as caching is concerned.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RenderOptions(Map<String, Value>);

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an arbitrary JSON value. Only objects (and `null`, meaning empty) are accepted.
    pub fn from_value(value: Value) -> LatexResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(LatexError::validation(format!(
                "render options must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Display (block) math when `true`, inline math when `false`.
    pub fn display(self, display: bool) -> Self {
        self.with("display", display)
    }

    /// Size of an em in pixels.
    pub fn em(self, px: f64) -> Self {
        self.with("em", px)
    }

    /// Size of an ex in pixels.
    pub fn ex(self, px: f64) -> Self {
        self.with("ex", px)
    }

    pub fn container_width(self, px: f64) -> Self {
        self.with("containerWidth", px)
    }

    pub fn line_width(self, px: f64) -> Self {
        self.with("lineWidth", px)
    }

    pub fn scale(self, scale: f64) -> Self {
        self.with("scale", scale)
    }

    pub fn to_json(&self) -> LatexResult<String> {
        serde_json::to_string(&self.0).map_err(|e| LatexError::serde(e.to_string()))
    }
}

impl From<Map<String, Value>> for RenderOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Composite cache key: the raw markup, `::`, then the serialized options.
pub fn cache_key(tex: &str, options: &RenderOptions) -> LatexResult<String> {
    Ok(format!("{tex}::{}", options.to_json()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_key_uses_empty_object() {
        let key = cache_key(r"\frac{a}{b}", &RenderOptions::new()).unwrap();
        assert_eq!(key, r"\frac{a}{b}::{}");
    }

    #[test]
    fn typed_setters_use_mathjax_names() {
        let opts = RenderOptions::new()
            .display(false)
            .em(16.0)
            .ex(8.0)
            .container_width(1280.0)
            .line_width(1e6)
            .scale(2.0);
        assert_eq!(opts.len(), 6);
        assert_eq!(opts.get("display"), Some(&Value::Bool(false)));
        assert_eq!(opts.get("containerWidth"), Some(&serde_json::json!(1280.0)));
        assert!(opts.get("container_width").is_none());
    }

    #[test]
    fn key_is_sensitive_to_number_spelling() {
        let a = RenderOptions::new().with("scale", 1);
        let b = RenderOptions::new().with("scale", 1.0);
        assert_ne!(cache_key("x", &a).unwrap(), cache_key("x", &b).unwrap());
    }

    #[test]
    fn key_order_is_part_of_the_key() {
        let a = RenderOptions::new().em(16.0).ex(8.0);
        let b = RenderOptions::new().ex(8.0).em(16.0);
        assert_eq!(cache_key("x", &a).unwrap(), r#"x::{"em":16.0,"ex":8.0}"#);
        assert_eq!(cache_key("x", &b).unwrap(), r#"x::{"ex":8.0,"em":16.0}"#);
    }

    #[test]
    fn parsed_options_keep_text_order() {
        let opts: RenderOptions = serde_json::from_str(r#"{"ex":8,"em":16}"#).unwrap();
        assert_eq!(opts.to_json().unwrap(), r#"{"ex":8,"em":16}"#);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(RenderOptions::from_value(serde_json::json!({"em": 12})).is_ok());
        assert!(
            RenderOptions::from_value(Value::Null)
                .unwrap()
                .is_empty()
        );
        let err = RenderOptions::from_value(serde_json::json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("validation error:"));
    }

    #[test]
    fn serde_is_transparent() {
        let opts: RenderOptions = serde_json::from_str(r#"{"display":true}"#).unwrap();
        assert_eq!(opts.get("display"), Some(&Value::Bool(true)));
        assert_eq!(serde_json::to_string(&opts).unwrap(), r#"{"display":true}"#);
    }
}
