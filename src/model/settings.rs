use crate::model::Currency;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// The visual theme. Only the preference is stored here, rendering is the UI's concern.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Glass,
    Light,
    Dark,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

impl Theme {
    /// The theme that follows this one when cycling: glass, light, dark, glass.
    pub fn next(self) -> Self {
        match self {
            Theme::Glass => Theme::Light,
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Glass,
        }
    }
}

const DEFAULT_USER_NAME: &str = "User";

/// Per-installation preferences.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    default_currency: Currency,
    theme: Theme,
    user_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: Currency::default(),
            theme: Theme::default(),
            user_name: DEFAULT_USER_NAME.to_string(),
        }
    }
}

impl Settings {
    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns a copy of these settings with every field present in `patch` applied.
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(currency) = patch.default_currency {
            next.default_currency = currency;
        }
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(user_name) = patch.user_name {
            next.user_name = user_name;
        }
        next
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.user_name.trim().is_empty() {
            return Err(Error::validation("Please enter a valid user name"));
        }
        Ok(())
    }
}

/// A partial settings document. Remote settings and imported files may carry only some of the
/// fields; whatever is missing keeps its current value.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.default_currency.is_none() && self.theme.is_none() && self.user_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency(), Currency::Ghs);
        assert_eq!(settings.theme(), Theme::Glass);
        assert_eq!(settings.user_name(), "User");
    }

    #[test]
    fn test_json_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"defaultCurrency": "GHS", "theme": "glass", "userName": "User"})
        );
    }

    #[test]
    fn test_merge_partial_remote_settings() {
        // The remote service does not know about userName.
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"defaultCurrency": "USD", "theme": "dark"}"#).unwrap();
        let current = Settings::default().merged(SettingsPatch {
            user_name: Some("Ama".into()),
            ..Default::default()
        });
        let merged = current.merged(patch);
        assert_eq!(merged.default_currency(), Currency::Usd);
        assert_eq!(merged.theme(), Theme::Dark);
        assert_eq!(merged.user_name(), "Ama");
    }

    #[test]
    fn test_validate_user_name() {
        let blank = Settings::default().merged(SettingsPatch {
            user_name: Some("  ".into()),
            ..Default::default()
        });
        assert!(blank.validate().unwrap_err().is_validation());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_theme_cycle() {
        assert_eq!(Theme::Glass.next(), Theme::Light);
        assert_eq!(Theme::Light.next(), Theme::Dark);
        assert_eq!(Theme::Dark.next(), Theme::Glass);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
    }
}
