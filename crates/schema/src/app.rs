//! The application schema: users, workspaces, and workspace membership.

use crate::define::{SchemaDefinition, define_schema, define_table, v};

pub const USERS: &str = "users";
pub const WORKSPACES: &str = "workspaces";
pub const WORKSPACE_MEMBERS: &str = "workspaceMembers";

/// Authentication tables owned by the external auth provider.
///
/// Stored as opaque documents; nothing here reads their contents.
pub const AUTH_TABLES: &[&str] = &[
    "authSessions",
    "authAccounts",
    "authRefreshTokens",
    "authVerificationCodes",
    "authVerifiers",
    "authRateLimits",
];

pub fn app_schema() -> SchemaDefinition {
    define_schema(
        AUTH_TABLES,
        [
            define_table(
                USERS,
                [
                    ("name", v::optional(v::string())),
                    ("email", v::optional(v::string())),
                    ("image", v::optional(v::string())),
                ],
            )
            .index("by_email", &["email"]),
            define_table(
                WORKSPACES,
                [
                    ("name", v::string()),
                    ("ownerId", v::id(USERS)),
                    ("createdAt", v::number()),
                ],
            )
            .index("by_owner", &["ownerId"])
            .non_negative("createdAt"),
            define_table(
                WORKSPACE_MEMBERS,
                [
                    ("workspaceId", v::id(WORKSPACES)),
                    ("userId", v::id(USERS)),
                    ("role", v::union([v::literal("admin"), v::literal("member")])),
                    ("joinedAt", v::number()),
                ],
            )
            .index("by_workspace", &["workspaceId"])
            .index("by_user", &["userId"])
            .unique_index("by_workspace_user", &["workspaceId", "userId"])
            .non_negative("joinedAt"),
        ],
    )
}
