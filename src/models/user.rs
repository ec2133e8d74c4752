//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::format_utc_rfc3339;

/// Languages offered by the app.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub enum Language {
    #[default]
    #[serde(rename = "sw")]
    Swahili,
    #[serde(rename = "ln")]
    Lingala,
    #[serde(rename = "am")]
    Amharic,
}

impl Language {
    pub const CODES: [&'static str; 3] = ["sw", "ln", "am"];

    pub fn code(self) -> &'static str {
        match self {
            Language::Swahili => "sw",
            Language::Lingala => "ln",
            Language::Amharic => "am",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::Swahili => "Swahili",
            Language::Lingala => "Lingala",
            Language::Amharic => "Amharic",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sw" => Ok(Language::Swahili),
            "ln" => Ok(Language::Lingala),
            "am" => Ok(Language::Amharic),
            other => Err(format!("unsupported language code '{}'", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Learner preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct Preferences {
    /// Target minutes per day
    pub daily_goal: u32,
    pub notifications: bool,
    pub offline_mode: bool,
    pub audio_enabled: bool,
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            daily_goal: 10,
            notifications: true,
            offline_mode: false,
            audio_enabled: true,
            dark_mode: false,
        }
    }
}

/// Partial preferences update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferencesPatch {
    pub daily_goal: Option<u32>,
    pub notifications: Option<bool>,
    pub offline_mode: Option<bool>,
    pub audio_enabled: Option<bool>,
    pub dark_mode: Option<bool>,
}

impl PreferencesPatch {
    pub fn apply(&self, prefs: &mut Preferences) {
        if let Some(v) = self.daily_goal {
            prefs.daily_goal = v;
        }
        if let Some(v) = self.notifications {
            prefs.notifications = v;
        }
        if let Some(v) = self.offline_mode {
            prefs.offline_mode = v;
        }
        if let Some(v) = self.audio_enabled {
            prefs.audio_enabled = v;
        }
        if let Some(v) = self.dark_mode {
            prefs.dark_mode = v;
        }
    }
}

/// Per-week learning counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct WeeklyStats {
    pub lessons_completed: u32,
    /// Minutes
    pub time_spent: u32,
    pub xp_earned: u32,
}

/// Lesson progress and unlocked achievements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct Progress {
    pub completed_lessons: Vec<String>,
    pub current_lesson: Option<String>,
    pub achievements: Vec<String>,
    pub weekly_stats: WeeklyStats,
}

/// Stored user record. Deliberately not `Serialize`: responses go through
/// [`UserProfile`] or [`UserSummary`], which have no password field.
#[derive(Clone)]
pub struct User {
    /// Immutable identifier, `user-<uuid>`
    pub id: String,
    /// Unique login email
    pub email: String,
    pub name: String,
    /// bcrypt hash (includes salt and cost)
    pub password_hash: String,
    pub selected_language: Language,
    pub streak: u32,
    pub total_xp: u32,
    pub level: u32,
    pub joined_date: DateTime<Utc>,
    pub preferences: Preferences,
    pub progress: Progress,
}

impl User {
    /// New learner with default progress and preferences.
    pub fn new(email: String, name: String, password_hash: String, language: Language) -> Self {
        Self {
            id: format!("user-{}", uuid::Uuid::new_v4()),
            email,
            name,
            password_hash,
            selected_language: language,
            streak: 0,
            total_xp: 0,
            level: 1,
            joined_date: Utc::now(),
            preferences: Preferences::default(),
            progress: Progress::default(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            selected_language: self.selected_language,
            streak: self.streak,
            total_xp: self.total_xp,
            level: self.level,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            selected_language: self.selected_language,
            streak: self.streak,
            total_xp: self.total_xp,
            level: self.level,
            joined_date: format_utc_rfc3339(self.joined_date),
            preferences: self.preferences.clone(),
            progress: self.progress.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("selected_language", &self.selected_language)
            .finish_non_exhaustive()
    }
}

/// Compact user view returned alongside token pairs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub selected_language: Language,
    pub streak: u32,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub level: u32,
}

/// Full user view without credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub selected_language: Language,
    pub streak: u32,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub level: u32,
    pub joined_date: String,
    pub preferences: Preferences,
    pub progress: Progress,
}

/// Partial update merged into an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub selected_language: Option<Language>,
    pub preferences: Option<PreferencesPatch>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.selected_language.is_none() && self.preferences.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(language) = self.selected_language {
            user.selected_language = language;
        }
        if let Some(patch) = &self.preferences {
            patch.apply(&mut user.preferences);
        }
    }
}
