//! Configuration validation
//!
//! Rules:
//! - declarative field rules on `InitConfig` (ranges, URLs, token present)
//! - header / param names are non-empty and contain no whitespace
//! - a refresh token comes with a refresh URL

use std::collections::BTreeMap;

use contracts::{ContractError, InitConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate an `InitConfig`
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &InitConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_metadata_keys("headers", &config.headers)?;
    validate_metadata_keys("params", &config.params)?;
    validate_authorization(config)?;
    Ok(())
}

/// Run the derived field rules
fn validate_fields(config: &InitConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error("", &errors)
                .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Pick the first failing field, in name order, descending into nested structs
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in entries {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", error.code));
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_error(&path, nested) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    if let Some(found) = first_error(&format!("{path}[{idx}]"), nested) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Validate HTTP metadata names
fn validate_metadata_keys(
    section: &str,
    entries: &BTreeMap<String, String>,
) -> Result<(), ContractError> {
    for key in entries.keys() {
        if key.trim().is_empty() {
            return Err(ContractError::config_validation(
                section,
                "names cannot be empty",
            ));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                format!("{section}[{key}]"),
                "names cannot contain whitespace",
            ));
        }
    }
    Ok(())
}

/// Validate credential consistency
fn validate_authorization(config: &InitConfig) -> Result<(), ContractError> {
    if let Some(auth) = &config.authorization {
        if auth.refresh_token.is_some() && auth.refresh_url.is_none() {
            return Err(ContractError::config_validation(
                "authorization.refresh_url",
                "refresh_url is required when refresh_token is set",
            ));
        }
    }
    Ok(())
}
