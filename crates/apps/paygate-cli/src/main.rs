//! paygate CLI binary entry point.

use clap::Parser;
use colored::Colorize;
use paygate_client::GatewayClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paygate_cli::{
    cli::{Cli, Commands},
    commands,
    config::{default_config_path, load_config},
    error::{CliError, CliResult},
    output::OutputFormat,
};

/// Directive applied on top of `RUST_LOG` with `--verbose`.
const VERBOSE_DIRECTIVE: &str = "paygate_client=debug,paygate_cli=debug";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on --verbose flag or RUST_LOG env var
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if cli.verbose || has_rust_log {
        let filter = if cli.verbose {
            EnvFilter::new(VERBOSE_DIRECTIVE)
        } else {
            EnvFilter::from_default_env()
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    if let Err(e) = run(cli).await {
        print_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// Print a user-friendly error message with exit code and recovery hint.
fn print_error(e: &CliError) {
    eprintln!(
        "{} [{}]: {}",
        "Error".red().bold(),
        e.exit_code().to_string().yellow(),
        e
    );

    if let Some(suggestion) = e.suggestion() {
        eprintln!("{}: {}", "Hint".cyan(), suggestion);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    // Load configuration
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;
    let client = GatewayClient::new(config)?;

    // Get output format
    let format: OutputFormat = cli.format.into();

    // Dispatch command
    let output = match cli.command {
        // Offline commands
        Commands::Sign { fields, sign_type } => {
            commands::sign(&client, format, &fields, sign_type.map(Into::into))?
        }

        Commands::QrUrl { product_id } => commands::qr_url(&client, format, &product_id)?,

        Commands::VerifyNotify { file } => commands::verify_notify(&client, format, &file)?,

        // Provider commands
        Commands::Call {
            method,
            fields,
            timeout,
        } => commands::call(&client, format, &method, &fields, timeout).await?,

        Commands::Bill {
            date,
            bill_type,
            output,
        } => commands::bill(&client, format, &date, &bill_type, output.as_deref()).await?,

        Commands::Session { code } => commands::session(&client, format, &code).await?,
    };

    // Print output
    println!("{}", output);

    Ok(())
}
