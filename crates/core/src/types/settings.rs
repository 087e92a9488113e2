//! Site settings.
//!
//! Settings are persisted as a flat `key -> string` table. This module owns
//! the set of recognized keys and the typed [`SiteSettings`] record the
//! storefront reads from that table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors raised while validating a setting.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The key is not one of [`SettingKey::ALL`].
    #[error("unknown setting: {0}")]
    UnknownKey(String),
    /// A boolean setting was given something other than `true`/`false`.
    #[error("setting {key} must be \"true\" or \"false\", got {value:?}")]
    InvalidBool {
        /// Setting key.
        key: SettingKey,
        /// Rejected value.
        value: String,
    },
    /// A text setting exceeded its maximum length.
    #[error("setting {key} must be at most {max} characters")]
    TooLong {
        /// Setting key.
        key: SettingKey,
        /// Maximum allowed length.
        max: usize,
    },
}

/// Recognized setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    /// Whether the hero banner is shown on the storefront.
    #[serde(alias = "show_hero")]
    HeroVisible,
    HeroTitle,
    HeroSubtitle,
    SiteTitle,
    ContactEmail,
    ContactPhone,
}

impl SettingKey {
    /// Every recognized key.
    pub const ALL: [Self; 6] = [
        Self::HeroVisible,
        Self::HeroTitle,
        Self::HeroSubtitle,
        Self::SiteTitle,
        Self::ContactEmail,
        Self::ContactPhone,
    ];

    /// Maximum stored length for text settings.
    pub const MAX_TEXT_LENGTH: usize = 500;

    /// Storage key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HeroVisible => "hero_visible",
            Self::HeroTitle => "hero_title",
            Self::HeroSubtitle => "hero_subtitle",
            Self::SiteTitle => "site_title",
            Self::ContactEmail => "contact_email",
            Self::ContactPhone => "contact_phone",
        }
    }

    /// Older name of the key still found in some databases.
    #[must_use]
    pub const fn legacy_alias(&self) -> Option<&'static str> {
        match self {
            Self::HeroVisible => Some("show_hero"),
            _ => None,
        }
    }

    /// Description stored next to the value.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::HeroVisible => "Show the hero section on the home page",
            Self::HeroTitle => "Hero section heading",
            Self::HeroSubtitle => "Hero section sub-heading",
            Self::SiteTitle => "Site title",
            Self::ContactEmail => "Public contact email",
            Self::ContactPhone => "Public contact phone",
        }
    }

    /// Whether the value is a boolean flag.
    #[must_use]
    pub const fn is_flag(&self) -> bool {
        matches!(self, Self::HeroVisible)
    }

    /// Value used when the key has never been stored.
    #[must_use]
    pub const fn default_value(&self) -> &'static str {
        match self {
            Self::HeroVisible => "true",
            _ => "",
        }
    }

    /// Validate and normalize a raw value for this key.
    ///
    /// Flags are lowercased; text is trimmed. An empty text value clears the
    /// setting.
    ///
    /// # Errors
    ///
    /// Returns an error for a flag that is not `true`/`false`, or for text
    /// longer than [`Self::MAX_TEXT_LENGTH`].
    pub fn normalize(self, raw: &str) -> Result<String, SettingsError> {
        let value = raw.trim();
        if self.is_flag() {
            return match value.to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_owned()),
                "false" => Ok("false".to_owned()),
                _ => Err(SettingsError::InvalidBool {
                    key: self,
                    value: raw.to_owned(),
                }),
            };
        }
        if value.chars().count() > Self::MAX_TEXT_LENGTH {
            return Err(SettingsError::TooLong {
                key: self,
                max: Self::MAX_TEXT_LENGTH,
            });
        }
        Ok(value.to_owned())
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s || key.legacy_alias() == Some(s))
            .ok_or_else(|| SettingsError::UnknownKey(s.to_owned()))
    }
}

/// Typed view of the settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub hero_visible: bool,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub site_title: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            hero_visible: true,
            hero_title: None,
            hero_subtitle: None,
            site_title: None,
            contact_email: None,
            contact_phone: None,
        }
    }
}

impl SiteSettings {
    /// Build from stored `(key, value)` pairs.
    ///
    /// Unknown keys and malformed values are skipped so that one bad row
    /// never hides the rest of the settings.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in pairs {
            if let Ok(key) = key.as_ref().parse::<SettingKey>() {
                let _ = settings.set(key, value.as_ref());
            }
        }
        settings
    }

    /// Current value of `key` in storage form.
    #[must_use]
    pub fn get(&self, key: SettingKey) -> Option<String> {
        match key {
            SettingKey::HeroVisible => Some(self.hero_visible.to_string()),
            SettingKey::HeroTitle => self.hero_title.clone(),
            SettingKey::HeroSubtitle => self.hero_subtitle.clone(),
            SettingKey::SiteTitle => self.site_title.clone(),
            SettingKey::ContactEmail => self.contact_email.clone(),
            SettingKey::ContactPhone => self.contact_phone.clone(),
        }
    }

    /// Validate and apply a raw value.
    ///
    /// # Errors
    ///
    /// See [`SettingKey::normalize`].
    pub fn set(&mut self, key: SettingKey, raw: &str) -> Result<(), SettingsError> {
        let value = key.normalize(raw)?;
        let text = (!value.is_empty()).then(|| value.clone());
        match key {
            SettingKey::HeroVisible => self.hero_visible = value == "true",
            SettingKey::HeroTitle => self.hero_title = text,
            SettingKey::HeroSubtitle => self.hero_subtitle = text,
            SettingKey::SiteTitle => self.site_title = text,
            SettingKey::ContactEmail => self.contact_email = text,
            SettingKey::ContactPhone => self.contact_phone = text,
        }
        Ok(())
    }

    /// Flat wire form. `hero_visible` is always present.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        SettingKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key.as_str().to_owned(), value)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse_accepts_legacy_alias() {
        assert_eq!("show_hero".parse::<SettingKey>().unwrap(), SettingKey::HeroVisible);
        assert_eq!("site_title".parse::<SettingKey>().unwrap(), SettingKey::SiteTitle);
        assert_eq!(
            "favicon".parse::<SettingKey>(),
            Err(SettingsError::UnknownKey("favicon".to_owned()))
        );
    }

    #[test]
    fn test_normalize_flag() {
        assert_eq!(SettingKey::HeroVisible.normalize(" FALSE ").unwrap(), "false");
        assert!(matches!(
            SettingKey::HeroVisible.normalize("yes"),
            Err(SettingsError::InvalidBool { .. })
        ));
    }

    #[test]
    fn test_normalize_text_length() {
        let long = "x".repeat(SettingKey::MAX_TEXT_LENGTH + 1);
        assert!(matches!(
            SettingKey::HeroTitle.normalize(&long),
            Err(SettingsError::TooLong { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let settings = SiteSettings::default();
        assert!(settings.hero_visible);
        let map = settings.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("hero_visible").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_from_pairs_skips_unknown_and_invalid() {
        let settings = SiteSettings::from_pairs([
            ("show_hero", "false"),
            ("site_title", "Repostería Artesanal"),
            ("mystery", "42"),
            ("hero_title", "   "),
        ]);
        assert!(!settings.hero_visible);
        assert_eq!(settings.site_title.as_deref(), Some("Repostería Artesanal"));
        assert_eq!(settings.hero_title, None);
    }

    #[test]
    fn test_set_empty_text_clears() {
        let mut settings = SiteSettings::default();
        settings.set(SettingKey::ContactPhone, "+57 300 000 0000").unwrap();
        assert!(settings.contact_phone.is_some());
        settings.set(SettingKey::ContactPhone, "").unwrap();
        assert_eq!(settings.contact_phone, None);
    }
}
