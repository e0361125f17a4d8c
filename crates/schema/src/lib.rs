//! Data model, schema declaration, and SQL builders for tenancy.
//!
//! This crate is the **single source of truth** for the table layout:
//! the [`app::app_schema`] declaration drives document validation, the
//! generated SQLite DDL, and the column identifiers used by the store.

pub mod app;
#[cfg(feature = "backend")]
pub mod db;
pub mod define;
pub mod validate;

use serde::{Deserialize, Serialize};

pub use define::{IndexDefinition, SchemaDefinition, SchemaError, TableDefinition, Validator};
pub use validate::ValidationError;

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Role within a workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role `{0}`, expected one of: admin, member")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

// ─── Ids ─────────────────────────────────────────────────────────────────────

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[cfg_attr(feature = "ts", derive(ts_rs::TS))]
        #[cfg_attr(feature = "ts", ts(export))]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh opaque key.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

document_id!(
    /// Key of a `users` document.
    UserId
);
document_id!(
    /// Key of a `workspaces` document.
    WorkspaceId
);
document_id!(
    /// Key of a `workspaceMembers` document.
    WorkspaceMemberId
);

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Milliseconds since the Unix epoch. Never negative.
///
/// Decodes from any whole JSON number, so `1000` and `1000.0` are equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "serde_json::Number", into = "i64")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export, type = "number"))]
pub struct Timestamp(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp must be non-negative, got {0}")]
    Negative(i64),
    #[error("timestamp must be a whole number of milliseconds, got {0}")]
    NotWholeMillis(String),
}

/// The `i64` value of a whole JSON number, if it has one.
pub fn whole_millis(number: &serde_json::Number) -> Option<i64> {
    if let Some(millis) = number.as_i64() {
        return Some(millis);
    }
    // 2^63 is exactly representable; anything at or above it overflows.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= -LIMIT && *f < LIMIT)
        .map(|f| f as i64)
}

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis().max(0))
    }

    pub fn from_millis(millis: i64) -> Result<Self, TimestampError> {
        if millis < 0 {
            return Err(TimestampError::Negative(millis));
        }
        Ok(Self(millis))
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0)
    }
}

impl TryFrom<i64> for Timestamp {
    type Error = TimestampError;

    fn try_from(millis: i64) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl TryFrom<serde_json::Number> for Timestamp {
    type Error = TimestampError;

    fn try_from(number: serde_json::Number) -> Result<Self, Self::Error> {
        match whole_millis(&number) {
            Some(millis) => Self::from_millis(millis),
            None => Err(TimestampError::NotWholeMillis(number.to_string())),
        }
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// A `users` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(rename = "_creationTime")]
    pub creation_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A `workspaces` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Workspace {
    #[serde(rename = "_id")]
    pub id: WorkspaceId,
    #[serde(rename = "_creationTime")]
    pub creation_time: Timestamp,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: Timestamp,
}

/// A `workspaceMembers` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct WorkspaceMember {
    #[serde(rename = "_id")]
    pub id: WorkspaceMemberId,
    #[serde(rename = "_creationTime")]
    pub creation_time: Timestamp,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: Timestamp,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update of a user. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewWorkspace {
    pub name: String,
    pub owner_id: UserId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewWorkspaceMember {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: Timestamp,
}
