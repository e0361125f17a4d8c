use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use tenancy_schema::app::{USERS, WORKSPACES};
use tenancy_schema::db::{members, workspaces};
use tenancy_schema::{
    NewWorkspace, NewWorkspaceMember, Role, Timestamp, UserId, Workspace, WorkspaceId,
    WorkspaceMember, WorkspaceMemberId,
};

use crate::sql::{sq_execute, sq_query_map, sq_query_row};
use crate::users::{timestamp_at, user_exists};
use crate::{Result, Store, StoreError};

/// A new workspace together with its owner's admin membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWorkspace {
    pub workspace: Workspace,
    pub owner_membership: WorkspaceMember,
}

impl Store {
    /// Create a workspace and add its owner as `admin`, atomically.
    ///
    /// The owner's membership is joined at `createdAt`.
    pub fn create_workspace(&self, workspace: &NewWorkspace) -> Result<CreatedWorkspace> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if !user_exists(&tx, &workspace.owner_id)? {
            return Err(StoreError::MissingReference {
                field: "ownerId",
                table: USERS,
                id: workspace.owner_id.to_string(),
            });
        }

        let id = WorkspaceId::generate();
        let creation_time = Timestamp::now();
        sq_execute(&tx, workspaces::insert(&id, creation_time, workspace))?;

        let membership = NewWorkspaceMember {
            workspace_id: id.clone(),
            user_id: workspace.owner_id.clone(),
            role: Role::Admin,
            joined_at: workspace.created_at,
        };
        let member_id = WorkspaceMemberId::generate();
        sq_execute(&tx, members::insert(&member_id, creation_time, &membership))?;
        tx.commit()?;

        tracing::debug!(workspace_id = %id, owner_id = %workspace.owner_id, "created workspace");
        Ok(CreatedWorkspace {
            workspace: Workspace {
                id,
                creation_time,
                name: workspace.name.clone(),
                owner_id: workspace.owner_id.clone(),
                created_at: workspace.created_at,
            },
            owner_membership: WorkspaceMember {
                id: member_id,
                creation_time,
                workspace_id: membership.workspace_id,
                user_id: membership.user_id,
                role: membership.role,
                joined_at: membership.joined_at,
            },
        })
    }

    pub fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        load_workspace(&self.conn(), id)
    }

    /// Workspaces owned by `owner_id`, newest first. Uses `by_owner`.
    pub fn workspaces_by_owner(&self, owner_id: &UserId) -> Result<Vec<Workspace>> {
        Ok(sq_query_map(
            &self.conn(),
            workspaces::by_owner(owner_id),
            row_to_workspace,
        )?)
    }

    pub fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(sq_query_map(
            &self.conn(),
            workspaces::list_all(),
            row_to_workspace,
        )?)
    }

    pub fn rename_workspace(&self, id: &WorkspaceId, name: &str) -> Result<Workspace> {
        let conn = self.conn();
        sq_execute(&conn, workspaces::update_name(id, name))?;
        load_workspace(&conn, id)?.ok_or_else(|| not_found(id))
    }

    /// Delete a workspace and all of its memberships.
    pub fn delete_workspace(&self, id: &WorkspaceId) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if !workspace_exists(&tx, id)? {
            return Err(not_found(id));
        }
        let removed = sq_execute(&tx, members::delete_for_workspace(id))?;
        sq_execute(&tx, workspaces::delete(id))?;
        tx.commit()?;
        tracing::debug!(workspace_id = %id, memberships = removed, "deleted workspace");
        Ok(())
    }
}

pub(crate) fn load_workspace(conn: &Connection, id: &WorkspaceId) -> Result<Option<Workspace>> {
    Ok(sq_query_row(conn, workspaces::get_by_id(id), row_to_workspace).optional()?)
}

pub(crate) fn workspace_exists(conn: &Connection, id: &WorkspaceId) -> Result<bool> {
    Ok(sq_query_row(conn, workspaces::exists(id), |row| row.get(0))?)
}

fn not_found(id: &WorkspaceId) -> StoreError {
    StoreError::NotFound {
        table: WORKSPACES,
        id: id.to_string(),
    }
}

fn row_to_workspace(row: &Row) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: WorkspaceId::from(row.get::<_, String>(0)?),
        creation_time: timestamp_at(row, 1)?,
        name: row.get(2)?,
        owner_id: UserId::from(row.get::<_, String>(3)?),
        created_at: timestamp_at(row, 4)?,
    })
}
