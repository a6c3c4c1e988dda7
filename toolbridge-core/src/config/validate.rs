//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.gemini.binary.trim().is_empty() {
        errors.push("gemini.binary must not be empty".to_string());
    }
    if config.gemini.timeout_secs == 0 {
        errors.push("gemini.timeout_secs must be > 0".to_string());
    }
    if config.gemini.admin_timeout_secs == 0 {
        errors.push("gemini.admin_timeout_secs must be > 0".to_string());
    }
    if let Some(model) = &config.gemini.default_model {
        if model.trim().is_empty() {
            errors.push("gemini.default_model must be null or non-empty".to_string());
        }
    }

    let api_base = config.zai.api_base.trim();
    if api_base.is_empty() {
        errors.push("zai.api_base must not be empty".to_string());
    } else if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
        errors.push("zai.api_base must be an http(s) URL".to_string());
    }
    if config.zai.default_model.trim().is_empty() {
        errors.push("zai.default_model must not be empty".to_string());
    }
    if config.zai.timeout_secs == 0 {
        errors.push("zai.timeout_secs must be > 0".to_string());
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push("logging.format must be 'text' or 'json'".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
