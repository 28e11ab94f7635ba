//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use paygate_client::SignType;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// paygate CLI.
#[derive(Parser, Debug)]
#[command(name = "paygate")]
#[command(author = "Paygate Contributors")]
#[command(version)]
#[command(about = "Sign, send and verify payment API envelopes")]
#[command(
    long_about = "paygate talks to the provider's merchant payment API.\n\nCredentials are read from a TOML file; see 'paygate --help' for the config flag."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "PAYGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Signature scheme argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SignTypeArg {
    /// MD5 (default).
    Md5,
    /// HMAC-SHA256.
    HmacSha256,
}

impl From<SignTypeArg> for SignType {
    fn from(arg: SignTypeArg) -> Self {
        match arg {
            SignTypeArg::Md5 => SignType::Md5,
            SignTypeArg::HmacSha256 => SignType::HmacSha256,
        }
    }
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // =========================================================================
    // Offline Commands
    // =========================================================================
    /// Sign a set of fields with the configured key.
    ///
    /// Prints the signature and the signed envelope. Nothing is sent.
    Sign {
        /// Fields as key=value pairs.
        #[arg(required = true)]
        fields: Vec<String>,

        /// Override the configured signature scheme.
        #[arg(long)]
        sign_type: Option<SignTypeArg>,
    },

    /// Build a mode-one QR payment URL for a product.
    QrUrl {
        /// Merchant product id.
        product_id: String,
    },

    /// Verify an inbound payment notification.
    ///
    /// Reads the raw XML body from a file, or from standard input with '-'.
    VerifyNotify {
        /// Notification body file, or '-' for standard input.
        file: PathBuf,
    },

    // =========================================================================
    // Provider Commands
    // =========================================================================
    /// Call a provider method.
    ///
    /// Credentials, nonce and signature are added automatically.
    Call {
        /// Method name (e.g. unified-order, order-query, refund).
        method: String,

        /// Fields as key=value pairs.
        fields: Vec<String>,

        /// Timeout override in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Download a reconciliation bill.
    Bill {
        /// Bill date (YYYYMMDD).
        date: String,

        /// Bill type (ALL, SUCCESS, REFUND, RECHARGE_REFUND).
        #[arg(long, default_value = "ALL")]
        bill_type: String,

        /// Write the bill to a file instead of standard output.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Exchange a mini-program login code for a session.
    Session {
        /// Login code from the mini-program.
        code: String,
    },
}
