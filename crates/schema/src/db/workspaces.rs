//! Workspace query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{WorkspaceMembers, Workspaces};
use crate::{NewWorkspace, Timestamp, UserId, WorkspaceId};

// ── Workspace columns helper ──────────────────────────────────────────────

/// Column list for workspace SELECT queries. `row_to_workspace` reads in this order.
pub fn workspace_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((Workspaces::Table, Workspaces::Id))
        .column((Workspaces::Table, Workspaces::CreationTime))
        .column((Workspaces::Table, Workspaces::Name))
        .column((Workspaces::Table, Workspaces::OwnerId))
        .column((Workspaces::Table, Workspaces::CreatedAt))
}

// ── Workspace queries ─────────────────────────────────────────────────────

/// INSERT a new workspace.
pub fn insert(id: &WorkspaceId, creation_time: Timestamp, workspace: &NewWorkspace) -> Built {
    Query::insert()
        .into_table(Workspaces::Table)
        .columns([
            Workspaces::Id,
            Workspaces::CreationTime,
            Workspaces::Name,
            Workspaces::OwnerId,
            Workspaces::CreatedAt,
        ])
        .values_panic([
            id.as_str().into(),
            creation_time.as_millis().into(),
            workspace.name.as_str().into(),
            workspace.owner_id.as_str().into(),
            workspace.created_at.as_millis().into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a single workspace by id.
pub fn get_by_id(id: &WorkspaceId) -> Built {
    let mut q = Query::select().to_owned();
    workspace_columns(&mut q);
    q.from(Workspaces::Table)
        .and_where(Expr::col((Workspaces::Table, Workspaces::Id)).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Lookup through `by_owner`, newest first.
pub fn by_owner(owner_id: &UserId) -> Built {
    let mut q = Query::select().to_owned();
    workspace_columns(&mut q);
    q.from(Workspaces::Table)
        .and_where(Expr::col((Workspaces::Table, Workspaces::OwnerId)).eq(owner_id.as_str()))
        .order_by((Workspaces::Table, Workspaces::CreatedAt), Order::Desc)
        .build(SqliteQueryBuilder)
}

/// List every workspace, oldest first.
pub fn list_all() -> Built {
    let mut q = Query::select().to_owned();
    workspace_columns(&mut q);
    q.from(Workspaces::Table)
        .order_by((Workspaces::Table, Workspaces::CreationTime), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Check if a workspace exists.
pub fn exists(id: &WorkspaceId) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Workspaces::Table)
        .and_where(Expr::col(Workspaces::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Count workspaces owned by a user.
pub fn owned_count(owner_id: &UserId) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Workspaces::Table)
        .and_where(Expr::col(Workspaces::OwnerId).eq(owner_id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Workspaces whose owner has no admin membership in them.
pub fn owners_without_admin() -> Built {
    let admin_rows = Query::select()
        .column(WorkspaceMembers::Id)
        .from(WorkspaceMembers::Table)
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId))
                .equals((Workspaces::Table, Workspaces::Id)),
        )
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::UserId))
                .equals((Workspaces::Table, Workspaces::OwnerId)),
        )
        .and_where(Expr::col((WorkspaceMembers::Table, WorkspaceMembers::Role)).eq("admin"))
        .to_owned();
    Query::select()
        .column((Workspaces::Table, Workspaces::Id))
        .column((Workspaces::Table, Workspaces::OwnerId))
        .from(Workspaces::Table)
        .and_where(Expr::exists(admin_rows).not())
        .order_by((Workspaces::Table, Workspaces::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Workspaces with a negative `createdAt`.
pub fn negative_created_at() -> Built {
    Query::select()
        .column(Workspaces::Id)
        .column(Workspaces::CreatedAt)
        .from(Workspaces::Table)
        .and_where(Expr::col(Workspaces::CreatedAt).lt(0))
        .build(SqliteQueryBuilder)
}

// ── Workspace updates ─────────────────────────────────────────────────────

/// Update a workspace's name.
pub fn update_name(id: &WorkspaceId, name: &str) -> Built {
    Query::update()
        .table(Workspaces::Table)
        .value(Workspaces::Name, name)
        .and_where(Expr::col(Workspaces::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// DELETE a workspace. Memberships must be removed first.
pub fn delete(id: &WorkspaceId) -> Built {
    Query::delete()
        .from_table(Workspaces::Table)
        .and_where(Expr::col(Workspaces::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}
