use crate::core::metadata::LookupTable;
use crate::utils::error::{ConvertError, Result};
use std::path::Path;

pub fn load_lookup(path: &Path) -> Result<LookupTable> {
    let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Missing or malformed lookup tables only cost the extra metadata.
pub fn load_lookup_or_default(path: &Path) -> LookupTable {
    match load_lookup(path) {
        Ok(table) => {
            tracing::info!(
                "Loaded lookup table {} ({} variable entries)",
                path.display(),
                table.variables.len()
            );
            table
        }
        Err(ConvertError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No lookup table at {}", path.display());
            LookupTable::default()
        }
        Err(e) => {
            tracing::warn!("Ignoring lookup table {}: {}", path.display(), e);
            LookupTable::default()
        }
    }
}
