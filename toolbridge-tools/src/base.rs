//! Base trait for tools

use async_trait::async_trait;
use serde_json::Value;
use toolbridge_providers::ProviderError;

/// Trait for tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the tool parameters schema (JSON Schema format)
    fn parameters(&self) -> Value;

    /// Execute the tool with arguments
    async fn execute(&self, args: Value) -> Result<String>;

    /// Validate parameters against the schema
    fn validate_params(&self, params: &Value) -> Vec<String> {
        // Only `required` is checked; types are checked by each tool
        let schema = self.parameters();

        let Some(params_obj) = params.as_object() else {
            return vec!["Parameters must be an object".to_string()];
        };

        let mut errors = Vec::new();
        if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
            for field in required {
                if let Some(field_name) = field.as_str() {
                    if !params_obj.contains_key(field_name) {
                        errors.push(format!("Missing required field: {}", field_name));
                    }
                }
            }
        }

        errors
    }

    /// Tool listing entry (name, description, inputSchema)
    fn to_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.parameters(),
        })
    }
}

/// Tool errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Required string argument
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParams(format!("Missing '{}' parameter", key)))
}

/// Optional string argument; empty strings and nulls count as absent
pub fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Optional boolean argument
pub fn optional_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Optional non-negative integer argument
pub fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(|v| v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_str_treats_empty_as_absent() {
        let args = json!({"a": "", "b": "x", "c": null, "d": 3});
        assert_eq!(optional_str(&args, "a"), None);
        assert_eq!(optional_str(&args, "b").as_deref(), Some("x"));
        assert_eq!(optional_str(&args, "c"), None);
        assert_eq!(optional_str(&args, "d"), None);
        assert_eq!(optional_str(&args, "missing"), None);
    }

    #[test]
    fn test_required_str_error_names_key() {
        let err = required_str(&json!({}), "prompt").unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters: Missing 'prompt' parameter");
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err: ToolError = ProviderError::CommandFailed("boom".to_string()).into();
        assert_eq!(err.to_string(), "boom");
    }
}
