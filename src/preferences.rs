// src/preferences.rs
use std::fmt;
use thiserror::Error;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages offered in settings. Only English text exists; the rest are stored as chosen.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Español"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("pt", "Português"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("Invalid theme '{0}'. Use 'light' or 'dark'.")]
    InvalidTheme(String),
    #[error("Language code cannot be empty.")]
    EmptyLanguage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Stored form, the literal `light` / `dark`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

// Only the two literal values are accepted
impl TryFrom<&str> for Theme {
    type Error = PreferencesError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(PreferencesError::InvalidTheme(other.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Preferences {
    /// Builds preferences from raw stored values, falling back to defaults
    /// for anything absent or unrecognised.
    pub fn from_stored(theme: Option<&str>, language: Option<&str>) -> Self {
        Self {
            theme: theme
                .and_then(|t| Theme::try_from(t).ok())
                .unwrap_or_default(),
            language: language
                .filter(|l| !l.is_empty())
                .map_or_else(|| DEFAULT_LANGUAGE.to_string(), str::to_string),
        }
    }

    /// Display name for the stored language code, if it is one of the offered ones.
    pub fn language_name(&self) -> Option<&'static str> {
        LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.language)
            .map(|(_, name)| *name)
    }

    /// Whether the chosen language actually changes any output.
    pub fn is_translated(&self) -> bool {
        self.language == DEFAULT_LANGUAGE
    }
}

/// Checks a language code before it is stored. Any non-empty code is accepted.
/// # Errors
/// `PreferencesError::EmptyLanguage`.
pub fn validate_language(code: &str) -> Result<String, PreferencesError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        Err(PreferencesError::EmptyLanguage)
    } else {
        Ok(trimmed.to_string())
    }
}
