use aca::config::cli::LogFormat;
use aca::utils::{logger, validation::Validate};
use aca::Cli;
use clap::Parser;

#[tokio::main]
async fn main() {
    // a missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::debug!("CLI arguments: {:?}", cli);

    let result = match cli.validate() {
        Ok(()) => aca::app::run(cli).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.severity().exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}
