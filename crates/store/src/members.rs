use rusqlite::{Connection, OptionalExtension, Row};
use tenancy_schema::app::{USERS, WORKSPACE_MEMBERS, WORKSPACES};
use tenancy_schema::db::members;
use tenancy_schema::{
    NewWorkspaceMember, Role, Timestamp, UserId, WorkspaceId, WorkspaceMember, WorkspaceMemberId,
};

use crate::sql::{sq_execute, sq_query_map, sq_query_row};
use crate::users::{timestamp_at, user_exists};
use crate::workspaces::{load_workspace, workspace_exists};
use crate::{Result, Store, StoreError};

impl Store {
    /// Add a user to a workspace. Each (workspace, user) pair is unique.
    pub fn add_member(&self, member: &NewWorkspaceMember) -> Result<WorkspaceMember> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if !workspace_exists(&tx, &member.workspace_id)? {
            return Err(StoreError::MissingReference {
                field: "workspaceId",
                table: WORKSPACES,
                id: member.workspace_id.to_string(),
            });
        }
        if !user_exists(&tx, &member.user_id)? {
            return Err(StoreError::MissingReference {
                field: "userId",
                table: USERS,
                id: member.user_id.to_string(),
            });
        }
        if load_member_for(&tx, &member.workspace_id, &member.user_id)?.is_some() {
            return Err(StoreError::DuplicateMembership {
                workspace_id: member.workspace_id.clone(),
                user_id: member.user_id.clone(),
            });
        }

        let id = WorkspaceMemberId::generate();
        let creation_time = Timestamp::now();
        sq_execute(&tx, members::insert(&id, creation_time, member))?;
        tx.commit()?;

        tracing::debug!(
            workspace_id = %member.workspace_id,
            user_id = %member.user_id,
            role = %member.role,
            "added member"
        );
        Ok(WorkspaceMember {
            id,
            creation_time,
            workspace_id: member.workspace_id.clone(),
            user_id: member.user_id.clone(),
            role: member.role,
            joined_at: member.joined_at,
        })
    }

    pub fn get_member(&self, id: &WorkspaceMemberId) -> Result<Option<WorkspaceMember>> {
        load_member(&self.conn(), id)
    }

    /// Members of a workspace, in join order. Uses `by_workspace`.
    pub fn members_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<WorkspaceMember>> {
        Ok(sq_query_map(
            &self.conn(),
            members::by_workspace(workspace_id),
            row_to_member,
        )?)
    }

    /// Memberships held by a user, in join order. Uses `by_user`.
    pub fn members_by_user(&self, user_id: &UserId) -> Result<Vec<WorkspaceMember>> {
        Ok(sq_query_map(
            &self.conn(),
            members::by_user(user_id),
            row_to_member,
        )?)
    }

    /// The membership of `user_id` in `workspace_id`. Uses `by_workspace_user`.
    pub fn member_for(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Option<WorkspaceMember>> {
        load_member_for(&self.conn(), workspace_id, user_id)
    }

    /// Change a member's role. The owner stays `admin`.
    pub fn set_role(&self, id: &WorkspaceMemberId, role: Role) -> Result<WorkspaceMember> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let member = load_member(&tx, id)?.ok_or_else(|| not_found(id))?;
        if role != Role::Admin && is_owner_membership(&tx, &member)? {
            return Err(StoreError::OwnerMembership {
                workspace_id: member.workspace_id,
            });
        }
        sq_execute(&tx, members::update_role(id, role))?;
        tx.commit()?;
        tracing::debug!(member_id = %id, role = %role, "changed role");
        Ok(WorkspaceMember { role, ..member })
    }

    /// Remove a membership. The owner's membership cannot be removed.
    pub fn remove_member(&self, id: &WorkspaceMemberId) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let member = load_member(&tx, id)?.ok_or_else(|| not_found(id))?;
        if is_owner_membership(&tx, &member)? {
            return Err(StoreError::OwnerMembership {
                workspace_id: member.workspace_id,
            });
        }
        sq_execute(&tx, members::delete(id))?;
        tx.commit()?;
        tracing::debug!(member_id = %id, "removed member");
        Ok(())
    }
}

fn is_owner_membership(conn: &Connection, member: &WorkspaceMember) -> Result<bool> {
    Ok(load_workspace(conn, &member.workspace_id)?
        .is_some_and(|ws| ws.owner_id == member.user_id))
}

pub(crate) fn load_member(
    conn: &Connection,
    id: &WorkspaceMemberId,
) -> Result<Option<WorkspaceMember>> {
    Ok(sq_query_row(conn, members::get_by_id(id), row_to_member).optional()?)
}

fn load_member_for(
    conn: &Connection,
    workspace_id: &WorkspaceId,
    user_id: &UserId,
) -> Result<Option<WorkspaceMember>> {
    Ok(sq_query_row(
        conn,
        members::by_workspace_user(workspace_id, user_id),
        row_to_member,
    )
    .optional()?)
}

fn not_found(id: &WorkspaceMemberId) -> StoreError {
    StoreError::NotFound {
        table: WORKSPACE_MEMBERS,
        id: id.to_string(),
    }
}

fn row_to_member(row: &Row) -> rusqlite::Result<WorkspaceMember> {
    let role: String = row.get(4)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(WorkspaceMember {
        id: WorkspaceMemberId::from(row.get::<_, String>(0)?),
        creation_time: timestamp_at(row, 1)?,
        workspace_id: WorkspaceId::from(row.get::<_, String>(2)?),
        user_id: UserId::from(row.get::<_, String>(3)?),
        role,
        joined_at: timestamp_at(row, 5)?,
    })
}
