//! Command-line interface for the paygate payment client.
//!
//! This crate provides the `paygate` binary. It includes commands for:
//!
//! - **Offline**: sign fields, build QR URLs, verify notifications
//! - **Provider calls**: any signed method, bill download, session exchange
//!
//! # Quick Start
//!
//! ```bash
//! # Sign a set of fields
//! paygate sign out_trade_no=T001 total_fee=100
//!
//! # Place an order
//! paygate call unified-order out_trade_no=T001 body=test total_fee=100 \
//!     trade_type=NATIVE product_id=P1
//!
//! # Verify a captured notification
//! paygate verify-notify notify.xml
//! ```
//!
//! # Output Formats
//!
//! All commands support `--format`:
//!
//! - `human` (default): Human-readable with colors
//! - `json`: Machine-readable JSON
//!
//! # Configuration
//!
//! Configuration is loaded from `~/.paygate/config.toml`. Override with
//! `--config` or `PAYGATE_CONFIG`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

// Re-export main types
pub use cli::{Cli, Commands, OutputFormatArg, SignTypeArg};
pub use config::{default_config_path, load_config};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Render};
