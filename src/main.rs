use anyhow::Context;
use clap::Parser;
use grads2nc::config::lookup::load_lookup_or_default;
use grads2nc::config::toml_config::ConversionSettings;
use grads2nc::utils::error::ErrorSeverity;
use grads2nc::utils::{logger, validation::Validate};
use grads2nc::{CliConfig, ConvertError, Converter, Dataset, NetcdfSink};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting grads2nc");
    tracing::debug!("CLI config: {:?}", config);

    let settings = match &config.config {
        Some(path) => ConversionSettings::from_file(path)
            .with_context(|| format!("Failed to load settings file '{}'", path.display()))?,
        None => ConversionSettings::default(),
    };

    for result in [config.validate(), settings.validate()] {
        if let Err(e) = result {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    match convert(&config, &settings) {
        Ok(output) => {
            println!("✅ Conversion completed successfully!");
            println!("📁 Output saved to: {}", output);
        }
        Err(e) => {
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn convert(config: &CliConfig, settings: &ConversionSettings) -> Result<String, ConvertError> {
    let lookup = load_lookup_or_default(&config.lookup_path(settings));
    let dataset = Dataset::open(&config.input, config.global_attributes(settings), &lookup)?;

    let output = config.output_path();
    let sink = NetcdfSink::create(&output)?;

    let mut converter = Converter::new_with_monitoring(
        config.read_plan(settings),
        config.monitor,
        config.budget_bytes(settings),
    );
    let summary = converter.run(&dataset, sink)?;
    tracing::info!(
        "✅ Converted {} variable(s) over {} time step(s) in {} read(s)",
        summary.variables,
        summary.time_steps,
        summary.reads
    );

    Ok(output.display().to_string())
}
