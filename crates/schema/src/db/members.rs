//! Workspace membership query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Users, WorkspaceMembers, Workspaces};
use crate::{NewWorkspaceMember, Role, Timestamp, UserId, WorkspaceId, WorkspaceMemberId};

/// Column list for member SELECT queries. `row_to_member` reads in this order.
pub fn member_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((WorkspaceMembers::Table, WorkspaceMembers::Id))
        .column((WorkspaceMembers::Table, WorkspaceMembers::CreationTime))
        .column((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId))
        .column((WorkspaceMembers::Table, WorkspaceMembers::UserId))
        .column((WorkspaceMembers::Table, WorkspaceMembers::Role))
        .column((WorkspaceMembers::Table, WorkspaceMembers::JoinedAt))
}

/// INSERT a workspace member.
pub fn insert(
    id: &WorkspaceMemberId,
    creation_time: Timestamp,
    member: &NewWorkspaceMember,
) -> Built {
    Query::insert()
        .into_table(WorkspaceMembers::Table)
        .columns([
            WorkspaceMembers::Id,
            WorkspaceMembers::CreationTime,
            WorkspaceMembers::WorkspaceId,
            WorkspaceMembers::UserId,
            WorkspaceMembers::Role,
            WorkspaceMembers::JoinedAt,
        ])
        .values_panic([
            id.as_str().into(),
            creation_time.as_millis().into(),
            member.workspace_id.as_str().into(),
            member.user_id.as_str().into(),
            member.role.as_str().into(),
            member.joined_at.as_millis().into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a single member by document id.
pub fn get_by_id(id: &WorkspaceMemberId) -> Built {
    let mut q = Query::select().to_owned();
    member_columns(&mut q);
    q.from(WorkspaceMembers::Table)
        .and_where(Expr::col((WorkspaceMembers::Table, WorkspaceMembers::Id)).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Lookup through `by_workspace`, in join order.
pub fn by_workspace(workspace_id: &WorkspaceId) -> Built {
    let mut q = Query::select().to_owned();
    member_columns(&mut q);
    q.from(WorkspaceMembers::Table)
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId))
                .eq(workspace_id.as_str()),
        )
        .order_by((WorkspaceMembers::Table, WorkspaceMembers::JoinedAt), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Lookup through `by_user`, in join order.
pub fn by_user(user_id: &UserId) -> Built {
    let mut q = Query::select().to_owned();
    member_columns(&mut q);
    q.from(WorkspaceMembers::Table)
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::UserId)).eq(user_id.as_str()),
        )
        .order_by((WorkspaceMembers::Table, WorkspaceMembers::JoinedAt), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Lookup through `by_workspace_user`.
pub fn by_workspace_user(workspace_id: &WorkspaceId, user_id: &UserId) -> Built {
    let mut q = Query::select().to_owned();
    member_columns(&mut q);
    q.from(WorkspaceMembers::Table)
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId))
                .eq(workspace_id.as_str()),
        )
        .and_where(
            Expr::col((WorkspaceMembers::Table, WorkspaceMembers::UserId)).eq(user_id.as_str()),
        )
        .build(SqliteQueryBuilder)
}

/// Count memberships held by a user.
pub fn count_for_user(user_id: &UserId) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(WorkspaceMembers::Table)
        .and_where(Expr::col(WorkspaceMembers::UserId).eq(user_id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Update a member's role.
pub fn update_role(id: &WorkspaceMemberId, role: Role) -> Built {
    Query::update()
        .table(WorkspaceMembers::Table)
        .value(WorkspaceMembers::Role, role.as_str())
        .and_where(Expr::col(WorkspaceMembers::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// DELETE one membership.
pub fn delete(id: &WorkspaceMemberId) -> Built {
    Query::delete()
        .from_table(WorkspaceMembers::Table)
        .and_where(Expr::col(WorkspaceMembers::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// DELETE every membership of a workspace.
pub fn delete_for_workspace(workspace_id: &WorkspaceId) -> Built {
    Query::delete()
        .from_table(WorkspaceMembers::Table)
        .and_where(Expr::col(WorkspaceMembers::WorkspaceId).eq(workspace_id.as_str()))
        .build(SqliteQueryBuilder)
}

// ── Integrity scans ───────────────────────────────────────────────────────

/// Members whose workspace or user document is missing.
/// Columns: member id, workspaceId, userId, workspace present, user present.
pub fn dangling_references() -> Built {
    let workspace_present = Query::select()
        .column(Workspaces::Id)
        .from(Workspaces::Table)
        .and_where(
            Expr::col((Workspaces::Table, Workspaces::Id))
                .equals((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId)),
        )
        .to_owned();
    let user_present = Query::select()
        .column(Users::Id)
        .from(Users::Table)
        .and_where(
            Expr::col((Users::Table, Users::Id))
                .equals((WorkspaceMembers::Table, WorkspaceMembers::UserId)),
        )
        .to_owned();
    Query::select()
        .column((WorkspaceMembers::Table, WorkspaceMembers::Id))
        .column((WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId))
        .column((WorkspaceMembers::Table, WorkspaceMembers::UserId))
        .expr(Expr::exists(workspace_present.clone()))
        .expr(Expr::exists(user_present.clone()))
        .from(WorkspaceMembers::Table)
        .cond_where(
            sea_query::Cond::any()
                .add(Expr::exists(workspace_present).not())
                .add(Expr::exists(user_present).not()),
        )
        .order_by((WorkspaceMembers::Table, WorkspaceMembers::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// (workspaceId, userId) pairs that occur more than once.
pub fn duplicate_pairs() -> Built {
    Query::select()
        .column(WorkspaceMembers::WorkspaceId)
        .column(WorkspaceMembers::UserId)
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(WorkspaceMembers::Table)
        .group_by_columns([WorkspaceMembers::WorkspaceId, WorkspaceMembers::UserId])
        .and_having(Expr::expr(Func::count(Expr::col(Asterisk))).gt(1))
        .build(SqliteQueryBuilder)
}

/// Members whose role is outside the declared literals.
pub fn invalid_roles() -> Built {
    Query::select()
        .column(WorkspaceMembers::Id)
        .column(WorkspaceMembers::Role)
        .from(WorkspaceMembers::Table)
        .and_where(
            Expr::col(WorkspaceMembers::Role)
                .is_not_in(Role::ALL.iter().map(|r| r.as_str())),
        )
        .build(SqliteQueryBuilder)
}

/// Members with a negative `joinedAt`.
pub fn negative_joined_at() -> Built {
    Query::select()
        .column(WorkspaceMembers::Id)
        .column(WorkspaceMembers::JoinedAt)
        .from(WorkspaceMembers::Table)
        .and_where(Expr::col(WorkspaceMembers::JoinedAt).lt(0))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_lookup_filters_both_columns() {
        let (sql, values) = by_workspace_user(&WorkspaceId::from("w1"), &UserId::from("u1"));
        assert!(sql.contains(r#""workspaceMembers"."workspaceId" = ?"#), "{sql}");
        assert!(sql.contains(r#""workspaceMembers"."userId" = ?"#), "{sql}");
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn insert_stores_role_literal() {
        let (_, values) = insert(
            &WorkspaceMemberId::from("m1"),
            Timestamp::from_millis(0).unwrap(),
            &NewWorkspaceMember {
                workspace_id: "w1".into(),
                user_id: "u1".into(),
                role: Role::Member,
                joined_at: Timestamp::from_millis(0).unwrap(),
            },
        );
        assert!(
            values
                .0
                .iter()
                .any(|v| *v == sea_query::Value::from("member"))
        );
    }

    #[test]
    fn duplicate_pairs_groups_by_pair() {
        let (sql, _) = duplicate_pairs();
        assert!(sql.contains("GROUP BY"), "{sql}");
        assert!(sql.contains("HAVING"), "{sql}");
    }
}
