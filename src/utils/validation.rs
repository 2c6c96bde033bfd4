use crate::utils::error::{ConvertError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Rejects only what netCDF itself refuses: empty names, `/`, control
/// characters and trailing whitespace.
pub fn validate_attribute_name(field_name: &str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("Attribute names cannot be empty")
    } else if name.contains('/') {
        Some("Attribute names cannot contain '/'")
    } else if name.chars().any(char::is_control) {
        Some("Attribute names cannot contain control characters")
    } else if name.ends_with(char::is_whitespace) {
        Some("Attribute names cannot end with whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
