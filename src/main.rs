//! streamstats CLI entry point

use clap::Parser;
use std::process::ExitCode;
use streamstats::config::{Cli, Settings};
use streamstats::pipeline;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let settings = Settings::from_cli(&cli);

    match pipeline::run(&settings) {
        Ok(result) => {
            println!();
            println!(
                "Summary: {} successful, {} failed, {} skipped (of {} datasets)",
                result.successful, result.failed, result.skipped, result.total_datasets
            );

            if result.failed > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = if cli.quiet {
        "error".to_string()
    } else {
        cli.log_level().to_string().to_lowercase()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.input.exists() {
        return Err(format!(
            "Input path does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    streamstats -i ./data -o ./reports\n    streamstats -i ./data/top_tracks.json -o ./reports --group-by genre",
            cli.input.display()
        ));
    }

    // The output directory is created on demand, but its parent must exist
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!(
                "Output parent directory does not exist: {}\n\n  Tip: The output directory will be created automatically,\n  but its parent directory must exist.\n  Example: mkdir -p {}",
                parent.display(),
                parent.display()
            ));
        }
    }

    Ok(())
}
