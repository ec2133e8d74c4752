// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request contracts for every mutating endpoint.
//!
//! Required fields are plain types (the shape pass guarantees presence);
//! optional fields are `Option`.
//!
//! The lesson, game, live-session and image-analysis contracts have no route
//! in this crate. The learning-content service mounts those endpoints and
//! wraps its handlers' bodies in [`Valid`](super::Valid) with these types.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::rules;
use super::{Field, FieldType, RequestSchema};
use crate::models::{Language, PreferencesPatch, UserUpdate};

const LANGUAGES: &[&str] = &Language::CODES;

const PREFERENCE_FIELDS: &[Field] = &[
    Field::optional("dailyGoal", FieldType::Integer),
    Field::optional("notifications", FieldType::Boolean),
    Field::optional("offlineMode", FieldType::Boolean),
    Field::optional("audioEnabled", FieldType::Boolean),
    Field::optional("darkMode", FieldType::Boolean),
];

// ─── Auth ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "rules::display_name"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(function = "rules::password_strength")
    )]
    pub password: String,
    pub selected_language: Language,
}

impl RequestSchema for RegisterRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("name", FieldType::String),
        Field::required("email", FieldType::String),
        Field::required("password", FieldType::String),
        Field::required("selectedLanguage", FieldType::OneOf(LANGUAGES)),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    pub password: String,
}

impl RequestSchema for LoginRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("email", FieldType::String),
        Field::required("password", FieldType::String),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RequestSchema for RefreshRequest {
    const FIELDS: &'static [Field] = &[Field::required("refreshToken", FieldType::String)];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

impl RequestSchema for LogoutRequest {
    const FIELDS: &'static [Field] = &[Field::optional("refreshToken", FieldType::String)];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
#[validate(schema(function = "new_password_differs", skip_on_field_errors = false))]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(function = "rules::password_strength")
    )]
    pub new_password: String,
}

fn new_password_differs(req: &ChangePasswordRequest) -> Result<(), ValidationError> {
    if !req.new_password.is_empty() && req.new_password == req.current_password {
        let mut err = ValidationError::new("password_reuse");
        err.message = Some("New password must differ from the current password".into());
        err.add_param("field".into(), &"newPassword");
        return Err(err);
    }
    Ok(())
}

impl RequestSchema for ChangePasswordRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("currentPassword", FieldType::String),
        Field::required("newPassword", FieldType::String),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub token: String,
}

impl RequestSchema for VerifyEmailRequest {
    const FIELDS: &'static [Field] = &[Field::required("token", FieldType::String)];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl RequestSchema for ForgotPasswordRequest {
    const FIELDS: &'static [Field] = &[Field::required("email", FieldType::String)];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl RequestSchema for ResetPasswordRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("token", FieldType::String),
        Field::required("newPassword", FieldType::String),
    ];
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferencesInput {
    #[validate(range(min = 1, max = 100, message = "Daily goal must be between 1 and 100"))]
    pub daily_goal: Option<i64>,
    pub notifications: Option<bool>,
    pub offline_mode: Option<bool>,
    pub audio_enabled: Option<bool>,
    pub dark_mode: Option<bool>,
}

impl PreferencesInput {
    pub fn into_patch(self) -> PreferencesPatch {
        PreferencesPatch {
            daily_goal: self.daily_goal.and_then(|g| u32::try_from(g).ok()),
            notifications: self.notifications,
            offline_mode: self.offline_mode,
            audio_enabled: self.audio_enabled,
            dark_mode: self.dark_mode,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "rules::display_name"))]
    pub name: Option<String>,
    pub selected_language: Option<Language>,
    #[validate(nested)]
    pub preferences: Option<PreferencesInput>,
}

impl UpdateProfileRequest {
    pub fn into_update(self) -> UserUpdate {
        UserUpdate {
            name: self.name.map(|name| name.trim().to_string()),
            selected_language: self.selected_language,
            preferences: self.preferences.map(PreferencesInput::into_patch),
        }
    }
}

impl RequestSchema for UpdateProfileRequest {
    const FIELDS: &'static [Field] = &[
        Field::optional("name", FieldType::String),
        Field::optional("selectedLanguage", FieldType::OneOf(LANGUAGES)),
        Field::optional("preferences", FieldType::Object(PREFERENCE_FIELDS)),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[validate(nested)]
    pub preferences: PreferencesInput,
}

impl RequestSchema for UpdatePreferencesRequest {
    const FIELDS: &'static [Field] = &[Field::required(
        "preferences",
        FieldType::Object(PREFERENCE_FIELDS),
    )];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeLanguageRequest {
    pub language: Language,
}

impl RequestSchema for ChangeLanguageRequest {
    const FIELDS: &'static [Field] = &[Field::required("language", FieldType::OneOf(LANGUAGES))];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    #[validate(custom(function = "rules::must_be_true"))]
    pub confirm_delete: bool,
}

impl RequestSchema for DeleteAccountRequest {
    const FIELDS: &'static [Field] = &[Field::required("confirmDelete", FieldType::Boolean)];
}

// ─── Learning activity ───────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    pub lesson_id: String,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    pub score: f64,
    /// Seconds, at most one hour
    #[validate(range(
        min = 1.0,
        max = 3600.0,
        message = "Time spent must be between 1 and 3600 seconds"
    ))]
    pub time_spent: f64,
    #[validate(range(min = 0, message = "Mistakes count cannot be negative"))]
    pub mistakes_count: i64,
}

impl RequestSchema for CompleteLessonRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("lessonId", FieldType::String),
        Field::required("score", FieldType::Number),
        Field::required("timeSpent", FieldType::Number),
        Field::required("mistakesCount", FieldType::Integer),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitGameScoreRequest {
    pub game_id: String,
    #[validate(range(min = 0.0, message = "Score cannot be negative"))]
    pub score: f64,
    #[validate(range(min = 1.0, message = "Duration must be at least 1 second"))]
    pub duration: f64,
    #[validate(range(min = 0, message = "Words correct cannot be negative"))]
    pub words_correct: i64,
    #[validate(range(min = 0, message = "Words incorrect cannot be negative"))]
    pub words_incorrect: i64,
}

impl RequestSchema for SubmitGameScoreRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("gameId", FieldType::OneOf(rules::GAME_IDS)),
        Field::required("score", FieldType::Number),
        Field::required("duration", FieldType::Number),
        Field::required("wordsCorrect", FieldType::Integer),
        Field::required("wordsIncorrect", FieldType::Integer),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct BookSessionRequest {
    pub speaker_id: String,
    #[validate(custom(function = "rules::future_date"))]
    pub date: String,
    #[validate(regex(path = *rules::SESSION_TIME, message = "Time must be in HH:MM format"))]
    pub time: String,
    /// Minutes
    #[validate(custom(function = "rules::session_length"))]
    pub duration: i64,
    #[validate(length(max = 5, message = "Maximum 5 topics allowed"))]
    pub topics: Option<Vec<String>>,
}

impl RequestSchema for BookSessionRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("speakerId", FieldType::String),
        Field::required("date", FieldType::String),
        Field::required("time", FieldType::String),
        Field::required("duration", FieldType::Integer),
        Field::optional("topics", FieldType::Array(&FieldType::String)),
    ];
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    pub language: Language,
    #[validate(range(min = 0.0, max = 1.0, message = "Confidence must be between 0 and 1"))]
    pub confidence: Option<f64>,
}

impl RequestSchema for AnalyzeImageRequest {
    const FIELDS: &'static [Field] = &[
        Field::required("language", FieldType::OneOf(LANGUAGES)),
        Field::optional("confidence", FieldType::Number),
    ];
}
