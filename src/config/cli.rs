use crate::config::toml_config::ConversionSettings;
use crate::config::{default_output_path, parse_attribute_overrides};
use crate::core::convert::ReadPlan;
use crate::core::dataset::MAX_MEMORY_BYTES;
use crate::domain::model::Attributes;
use crate::utils::error::Result;
use crate::utils::validation::{validate_attribute_name, validate_positive_number, Validate};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_LOOKUP_FILE: &str = "grads2netcdf.json";

#[derive(Debug, Clone, Parser)]
#[command(name = "grads2nc")]
#[command(about = "Convert a GrADS descriptor and its binary data file to netCDF")]
pub struct CliConfig {
    /// Output file (default: INFILE with a .nc extension)
    #[arg(short = 'o', value_name = "OUTFILE")]
    pub output: Option<PathBuf>,

    /// Descriptor (.ctl) file
    #[arg(value_name = "INFILE")]
    pub input: PathBuf,

    /// Global attribute overrides as key:value
    #[arg(value_name = "key:value")]
    pub attributes: Vec<String>,

    /// JSON lookup table with dataset and variable metadata
    #[arg(long, value_name = "PATH")]
    pub lookup: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read each variable in time batches bounded by --max-memory
    #[arg(long)]
    pub chunked: bool,

    /// Read budget in bytes for chunked conversion
    #[arg(long, value_name = "BYTES")]
    pub max_memory: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log resident memory after each variable")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }

    /// Overrides from the settings file, then the command line on top.
    pub fn global_attributes(&self, settings: &ConversionSettings) -> Attributes {
        let mut attributes = settings.attributes();
        attributes.extend(parse_attribute_overrides(&self.attributes));
        attributes
    }

    pub fn lookup_path(&self, settings: &ConversionSettings) -> PathBuf {
        self.lookup
            .clone()
            .or_else(|| settings.conversion.lookup.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOOKUP_FILE))
    }

    pub fn budget_bytes(&self, settings: &ConversionSettings) -> usize {
        self.max_memory
            .or(settings.conversion.max_memory_bytes)
            .unwrap_or(MAX_MEMORY_BYTES)
    }

    pub fn read_plan(&self, settings: &ConversionSettings) -> ReadPlan {
        if self.chunked || settings.conversion.chunked.unwrap_or(false) {
            ReadPlan::Chunked {
                budget_bytes: self.budget_bytes(settings),
            }
        } else {
            ReadPlan::Whole
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_path("INFILE", &self.input.to_string_lossy())?;
        if let Some(max_memory) = self.max_memory {
            validate_positive_number("--max-memory", max_memory, 4)?;
        }
        for key in parse_attribute_overrides(&self.attributes).keys() {
            validate_attribute_name("key:value", key)?;
        }
        Ok(())
    }
}
