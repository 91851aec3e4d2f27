use std::env;

use strum::{Display, EnumString};

/// Environment variable that raises the default log filter to `debug`.
pub const DEBUG_ENV_VAR: &str = "DYGREP_DEBUG";

/// Older spelling of [`DEBUG_ENV_VAR`], still honoured.
pub const LEGACY_DEBUG_ENV_VAR: &str = "dygrep_is_debug";

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Returns true when [`DEBUG_ENV_VAR`] or [`LEGACY_DEBUG_ENV_VAR`] asks for
/// verbose logging.
#[must_use]
pub fn debug_requested() -> bool {
    let current = env::var(DEBUG_ENV_VAR).ok();
    let legacy = env::var(LEGACY_DEBUG_ENV_VAR).ok();
    debug_flag(current.as_deref(), legacy.as_deref())
}

/// Combines the values of the two debug variables; either one being truthy
/// enables debug logging.
#[must_use]
pub fn debug_flag(current: Option<&str>, legacy: Option<&str>) -> bool {
    [current, legacy].into_iter().flatten().any(is_truthy)
}

/// Picks the effective log filter.
///
/// An explicit filter always wins; otherwise the debug flag selects `debug`
/// and the binary's default applies last.
#[must_use]
pub fn resolve_log_filter(explicit: Option<&str>, debug: bool, fallback: &str) -> String {
    match explicit {
        Some(filter) => filter.to_owned(),
        None if debug => String::from("debug"),
        None => fallback.to_owned(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}
