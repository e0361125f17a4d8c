//! User query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Users;
use crate::{NewUser, Timestamp, UserId, UserPatch};

/// Column list for user SELECT queries. `row_to_user` reads in this order.
pub fn user_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((Users::Table, Users::Id))
        .column((Users::Table, Users::CreationTime))
        .column((Users::Table, Users::Name))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::Image))
}

/// INSERT a new user.
pub fn insert(id: &UserId, creation_time: Timestamp, user: &NewUser) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::CreationTime,
            Users::Name,
            Users::Email,
            Users::Image,
        ])
        .values_panic([
            id.as_str().into(),
            creation_time.as_millis().into(),
            user.name.clone().into(),
            user.email.clone().into(),
            user.image.clone().into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a single user by id.
pub fn get_by_id(id: &UserId) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Id)).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// Lookup through `by_email`.
pub fn by_email(email: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Email)).eq(email))
        .order_by((Users::Table, Users::CreationTime), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Check if a user exists.
pub fn exists(id: &UserId) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

/// UPDATE the fields named in `patch`. Returns `None` for an empty patch.
pub fn patch(id: &UserId, patch: &UserPatch) -> Option<Built> {
    if patch.is_empty() {
        return None;
    }
    let mut q = Query::update();
    q.table(Users::Table);
    if let Some(name) = &patch.name {
        q.value(Users::Name, name.clone());
    }
    if let Some(email) = &patch.email {
        q.value(Users::Email, email.clone());
    }
    if let Some(image) = &patch.image {
        q.value(Users::Image, image.clone());
    }
    Some(
        q.and_where(Expr::col(Users::Id).eq(id.as_str()))
            .build(SqliteQueryBuilder),
    )
}

/// DELETE a user.
pub fn delete(id: &UserId) -> Built {
    Query::delete()
        .from_table(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id.as_str()))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_email_filters_on_email_column() {
        let (sql, values) = by_email("a@example.com");
        assert!(sql.contains(r#"FROM "users""#), "{sql}");
        assert!(sql.contains(r#""users"."email" = ?"#), "{sql}");
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn insert_binds_every_column() {
        let (sql, values) = insert(
            &UserId::from("u1"),
            Timestamp::from_millis(1).unwrap(),
            &NewUser {
                name: Some("Ada".into()),
                ..Default::default()
            },
        );
        assert!(sql.starts_with(r#"INSERT INTO "users""#), "{sql}");
        assert!(sql.contains(r#""_creationTime""#), "{sql}");
        assert_eq!(values.0.len(), 5);
    }

    #[test]
    fn empty_patch_builds_nothing() {
        assert!(patch(&UserId::from("u1"), &UserPatch::default()).is_none());
        let (sql, values) = patch(
            &UserId::from("u1"),
            &UserPatch {
                email: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(sql.contains(r#""email" = ?"#), "{sql}");
        assert!(!sql.contains(r#""name""#), "{sql}");
        assert_eq!(values.0.len(), 2);
    }
}
