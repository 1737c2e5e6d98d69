//! Bot settings loaded from config.toml
//!
//! Every key is optional; missing keys (or a missing file) fall back to the defaults
//! below. The path can be overridden with the `PANEL_BUDDY_CONFIG` environment variable.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Settings shared by all wizards.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WizardSettings {
    /// Seconds of inactivity after which a wizard step aborts the whole wizard
    pub idle_timeout_secs: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 60,
        }
    }
}

impl WizardSettings {
    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Ticket panel limits and defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TicketSettings {
    /// Panels a guild may configure
    pub max_panels: usize,
    /// Choices (buttons) per panel
    pub max_choices: usize,
    /// Open tickets per user when the setup step is skipped
    pub default_max_tickets: i64,
    /// Largest accepted value for open tickets per user
    pub max_tickets_limit: i64,
    /// Reject unparsable numbers instead of keeping the previous value
    pub strict_numbers: bool,
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            max_panels: 5,
            max_choices: 5,
            default_max_tickets: 2,
            max_tickets_limit: 10,
            strict_numbers: false,
        }
    }
}

/// Reaction-role panel limits.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReactionRoleSettings {
    /// Panels a guild may configure
    pub max_panels: usize,
    /// Roles per panel
    pub max_roles: usize,
}

impl Default for ReactionRoleSettings {
    fn default() -> Self {
        Self {
            max_panels: 10,
            max_roles: 10,
        }
    }
}

/// Structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// `[wizard]` table
    pub wizard: WizardSettings,
    /// `[tickets]` table
    pub tickets: TicketSettings,
    /// `[reaction_roles]` table
    pub reaction_roles: ReactionRoleSettings,
}

/// Discord renders at most 25 buttons per message.
const MAX_BUTTONS: usize = 25;

impl Settings {
    /// Checks values that would produce unusable wizards.
    pub fn validate(&self) -> Result<()> {
        if self.wizard.idle_timeout_secs == 0 {
            return Err(Error::Config {
                message: "wizard.idle_timeout_secs must be positive".to_string(),
            });
        }
        if self.tickets.max_choices == 0 || self.tickets.max_choices > MAX_BUTTONS {
            return Err(Error::Config {
                message: format!("tickets.max_choices must be between 1 and {MAX_BUTTONS}"),
            });
        }
        if self.reaction_roles.max_roles == 0 || self.reaction_roles.max_roles > MAX_BUTTONS {
            return Err(Error::Config {
                message: format!("reaction_roles.max_roles must be between 1 and {MAX_BUTTONS}"),
            });
        }
        if !(1..=self.tickets.max_tickets_limit).contains(&self.tickets.default_max_tickets) {
            return Err(Error::Config {
                message: "tickets.default_max_tickets must be between 1 and tickets.max_tickets_limit"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from a TOML file; a missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, is not valid TOML, or holds
/// out-of-range values.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using default settings.", path.display());
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `PANEL_BUDDY_CONFIG` or ./config.toml
pub fn load_default_settings() -> Result<Settings> {
    let path =
        std::env::var("PANEL_BUDDY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_settings() {
        let toml_str = r"
            [wizard]
            idle_timeout_secs = 90

            [tickets]
            max_choices = 8
            strict_numbers = true
        ";

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.wizard.idle_timeout(), Duration::from_secs(90));
        assert_eq!(settings.tickets.max_choices, 8);
        assert!(settings.tickets.strict_numbers);
        // Untouched keys keep their defaults
        assert_eq!(settings.tickets.max_panels, 5);
        assert_eq!(settings.tickets.default_max_tickets, 2);
        assert_eq!(settings.reaction_roles, ReactionRoleSettings::default());
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        assert!(parse_settings("[tickets]\nmax_choices = 30").is_err());
        assert!(parse_settings("[wizard]\nidle_timeout_secs = 0").is_err());
        assert!(parse_settings("[tickets]\ndefault_max_tickets = 20").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = load_settings("does/not/exist.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
