use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("Time range {start}..{end} out of range for '{name}' (tsize {len})")]
    OutOfRange {
        name: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read error on {} at byte {offset}: {source}", .path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "netcdf")]
    #[error("netCDF error on {}: {source}", .path.display())]
    Netcdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Unsupported,
    Configuration,
    Request,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ConvertError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse { .. } | Self::TomlParse(_) | Self::Json(_) => ErrorCategory::Parse,
            Self::UnsupportedFeature { .. } => ErrorCategory::Unsupported,
            Self::Config { .. } | Self::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            Self::UnknownVariable { .. } | Self::OutOfRange { .. } => ErrorCategory::Request,
            Self::Io { .. } | Self::Read { .. } => ErrorCategory::Io,
            #[cfg(feature = "netcdf")]
            Self::Netcdf { .. } => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::Medium,
            ErrorCategory::Parse | ErrorCategory::Unsupported | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::Parse { line, .. } => {
                format!("Check line {} of the descriptor for a malformed number or token", line)
            }
            Self::UnsupportedFeature { .. } => {
                "Only linear xdef/ydef/zdef/tdef definitions with dy or mo steps are supported"
                    .to_string()
            }
            Self::Config { .. } => {
                "Make sure the descriptor declares dset, undef, xdef, ydef, zdef and tdef"
                    .to_string()
            }
            Self::UnknownVariable { .. } => {
                "Use one of the names declared between 'vars' and 'endvars'".to_string()
            }
            Self::OutOfRange { len, .. } => {
                format!("Request time indices within 0..{}", len)
            }
            Self::Io { path, .. } => format!("Check that {} exists and is accessible", path.display()),
            Self::Read { path, .. } => format!(
                "The binary file {} may be truncated or not match the descriptor grid",
                path.display()
            ),
            Self::InvalidConfigValue { field, .. } => format!("Fix the value of '{}'", field),
            Self::TomlParse(_) => "Make sure the settings file is valid TOML".to_string(),
            Self::Json(_) => "Make sure the lookup table is valid JSON".to_string(),
            #[cfg(feature = "netcdf")]
            Self::Netcdf { path, .. } => {
                format!("Check that {} can be written", path.display())
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Parse => format!("Could not parse input: {}", self),
            ErrorCategory::Unsupported => format!("Descriptor uses an unsupported feature: {}", self),
            ErrorCategory::Configuration => format!("Descriptor or settings incomplete: {}", self),
            ErrorCategory::Request => format!("Invalid read request: {}", self),
            ErrorCategory::Io => format!("File access failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
