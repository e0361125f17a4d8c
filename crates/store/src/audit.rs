//! Integrity scan for databases that may have been written by other tools.
//!
//! The store's own writes never produce a violation.

use serde::Serialize;
use tenancy_schema::app::{WORKSPACE_MEMBERS, WORKSPACES};
use tenancy_schema::db::{members, workspaces};

use crate::sql::sq_query_map;
use crate::{Result, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A member's `workspaceId` has no workspace document.
    DanglingWorkspace {
        member_id: String,
        workspace_id: String,
    },
    /// A member's `userId` has no user document.
    DanglingUser { member_id: String, user_id: String },
    /// A workspace owner without an admin membership in it.
    OwnerNotAdmin {
        workspace_id: String,
        owner_id: String,
    },
    DuplicateMembership {
        workspace_id: String,
        user_id: String,
        count: i64,
    },
    InvalidRole { member_id: String, role: String },
    NegativeTimestamp {
        table: &'static str,
        id: String,
        field: &'static str,
        value: i64,
    },
}

impl Store {
    /// Report every integrity violation found.
    pub fn audit(&self) -> Result<Vec<Violation>> {
        let conn = self.conn();
        let mut violations = Vec::new();

        let dangling = sq_query_map(&conn, members::dangling_references(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;
        for (member_id, workspace_id, user_id, has_workspace, has_user) in dangling {
            if !has_workspace {
                violations.push(Violation::DanglingWorkspace {
                    member_id: member_id.clone(),
                    workspace_id,
                });
            }
            if !has_user {
                violations.push(Violation::DanglingUser { member_id, user_id });
            }
        }

        violations.extend(sq_query_map(
            &conn,
            workspaces::owners_without_admin(),
            |row| {
                Ok(Violation::OwnerNotAdmin {
                    workspace_id: row.get(0)?,
                    owner_id: row.get(1)?,
                })
            },
        )?);

        violations.extend(sq_query_map(&conn, members::duplicate_pairs(), |row| {
            Ok(Violation::DuplicateMembership {
                workspace_id: row.get(0)?,
                user_id: row.get(1)?,
                count: row.get(2)?,
            })
        })?);

        violations.extend(sq_query_map(&conn, members::invalid_roles(), |row| {
            Ok(Violation::InvalidRole {
                member_id: row.get(0)?,
                role: row.get(1)?,
            })
        })?);

        violations.extend(sq_query_map(&conn, workspaces::negative_created_at(), |row| {
            Ok(Violation::NegativeTimestamp {
                table: WORKSPACES,
                id: row.get(0)?,
                field: "createdAt",
                value: row.get(1)?,
            })
        })?);

        violations.extend(sq_query_map(&conn, members::negative_joined_at(), |row| {
            Ok(Violation::NegativeTimestamp {
                table: WORKSPACE_MEMBERS,
                id: row.get(0)?,
                field: "joinedAt",
                value: row.get(1)?,
            })
        })?);

        if !violations.is_empty() {
            tracing::warn!(count = violations.len(), "audit found violations");
        }
        Ok(violations)
    }
}
