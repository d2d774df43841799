//! Output formats shared by the CLI commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified output format for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty"]
    }

    /// Serialize `value` according to a JSON variant; `None` for table formats.
    pub fn to_json<T: Serialize>(&self, value: &T) -> Option<serde_json::Result<String>> {
        match self {
            Self::Json => Some(serde_json::to_string(value)),
            Self::JsonPretty => Some(serde_json::to_string_pretty(value)),
            Self::Table | Self::Markdown => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}
