//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const NAME_MIN_LEN: usize = 2;

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Auth provider UID (document ID, not stored as a field)
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub uid: String,
    pub name: String,
    /// Lowercase canonical username
    pub username: String,
    /// Username as the user typed it
    #[serde(default)]
    pub display_username: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rants_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    /// Older profiles lack the flag and count as completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_completed: Option<bool>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_completed(&self) -> bool {
        self.profile_completed != Some(false)
    }

    /// Username in the case the user chose, falling back to the canonical form.
    pub fn shown_username(&self) -> &str {
        self.display_username.as_deref().unwrap_or(&self.username)
    }
}

/// Username reservation (`usernames/{lowercase username}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameRecord {
    pub uid: String,
    pub username: String,
    #[serde(default)]
    pub display_username: Option<String>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Profile counters that other stores bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStat {
    RantsCount,
    CommentsCount,
}

impl UserStat {
    pub fn field(self) -> &'static str {
        match self {
            UserStat::RantsCount => "rantsCount",
            UserStat::CommentsCount => "commentsCount",
        }
    }
}

/// Aggregate numbers shown on a profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsSummary {
    pub rants_count: i64,
    pub comments_count: i64,
    pub upvotes_received: i64,
}

/// Profile setup form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 160, message = "Bio must be 160 characters or less"))]
    pub bio: String,
    #[serde(default, rename = "photoURL")]
    #[validate(url(message = "Photo URL must be a valid URL"))]
    pub photo_url: Option<String>,
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(max = 160, message = "Bio must be 160 characters or less"))]
    pub bio: Option<String>,
    #[serde(rename = "photoURL")]
    #[validate(url(message = "Photo URL must be a valid URL"))]
    pub photo_url: Option<String>,
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_error("required", "Name is required"));
    }
    if trimmed.chars().count() < NAME_MIN_LEN {
        return Err(validation_error(
            "length",
            "Name must be at least 2 characters",
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(validation_error("required", "Username is required"));
    }
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(validation_error(
            "length",
            "Username must be at least 3 characters",
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err(validation_error(
            "length",
            "Username must be less than 20 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(validation_error(
            "charset",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

/// First validation message, by field name, for an API error response.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    fields
        .first()
        .and_then(|field| field_errors.get(*field))
        .and_then(|errs| errs.first())
        .map(|err| {
            err.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", err.code))
        })
        .unwrap_or_else(|| "Invalid profile".to_string())
}
