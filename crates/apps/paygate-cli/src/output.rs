//! Output formatting for CLI.

use std::collections::BTreeMap;

use colored::Colorize;
use paygate_client::FieldMap;
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'human' or 'json'.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Trait for renderable output.
pub trait Render {
    /// Render as human-readable string.
    fn render_human(&self) -> String;

    /// Render as JSON string.
    fn render_json(&self) -> String;

    /// Render in the specified format.
    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => self.render_json(),
        }
    }
}

/// Render fields as aligned `key  value` lines.
fn field_lines(fields: &BTreeMap<String, String>) -> Vec<String> {
    let width = fields.keys().map(String::len).max().unwrap_or(0);
    fields
        .iter()
        .map(|(k, v)| format!("  {}  {}", format!("{:width$}", k, width = width).bold(), v))
        .collect()
}

fn to_map(fields: &FieldMap) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Output Types
// =============================================================================

/// Output for the sign command.
#[derive(Debug, Serialize)]
pub struct SignOutput {
    pub sign_type: String,
    pub sign: String,
    pub xml: String,
}

impl Render for SignOutput {
    fn render_human(&self) -> String {
        format!(
            "{} {}\n{} {}\n{}\n{}",
            "Sign type:".bold(),
            self.sign_type,
            "Signature:".green().bold(),
            self.sign,
            "Envelope:".bold(),
            self.xml
        )
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for a verified provider response or notification.
#[derive(Debug, Serialize)]
pub struct EnvelopeOutput {
    pub method: String,
    pub business_success: bool,
    pub fields: BTreeMap<String, String>,
}

impl EnvelopeOutput {
    pub fn new(method: impl Into<String>, fields: &FieldMap) -> Self {
        Self {
            method: method.into(),
            business_success: fields.is("result_code", "SUCCESS"),
            fields: to_map(fields),
        }
    }
}

impl Render for EnvelopeOutput {
    fn render_human(&self) -> String {
        let status = if self.business_success {
            "SUCCESS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        let mut lines = vec![format!("{} {} ({})", "Verified:".bold(), self.method, status)];
        lines.extend(field_lines(&self.fields));
        lines.join("\n")
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for the bill command.
#[derive(Debug, Serialize)]
pub struct BillOutput {
    pub bill_date: String,
    pub lines: usize,
    /// File the bill was written to, if any.
    pub path: Option<String>,
    /// Bill text when not written to a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Render for BillOutput {
    fn render_human(&self) -> String {
        if self.lines == 0 {
            return format!(
                "{} no bill for {}",
                "Empty:".yellow().bold(),
                self.bill_date
            );
        }
        match (&self.path, &self.content) {
            (Some(path), _) => format!(
                "{} {} lines for {} written to {}",
                "Downloaded:".green().bold(),
                self.lines,
                self.bill_date,
                path
            ),
            (None, Some(content)) => content.clone(),
            (None, None) => String::new(),
        }
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for the qr-url command.
#[derive(Debug, Serialize)]
pub struct QrUrlOutput {
    pub product_id: String,
    pub url: String,
}

impl Render for QrUrlOutput {
    fn render_human(&self) -> String {
        self.url.clone()
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for the session command.
///
/// The session key is never printed.
#[derive(Debug, Serialize)]
pub struct SessionOutput {
    pub openid: Option<String>,
    pub unionid: Option<String>,
    pub has_session_key: bool,
}

impl Render for SessionOutput {
    fn render_human(&self) -> String {
        let mut lines = vec![format!(
            "{} {}",
            "OpenID:".bold(),
            self.openid.as_deref().unwrap_or("-")
        )];
        if let Some(unionid) = &self.unionid {
            lines.push(format!("{} {}", "UnionID:".bold(), unionid));
        }
        lines.push(format!(
            "{} {}",
            "Session key:".bold(),
            if self.has_session_key { "received" } else { "missing" }
        ));
        lines.join("\n")
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
