use rusqlite::{Connection, OptionalExtension, Row};
use tenancy_schema::app::USERS;
use tenancy_schema::db::{members, users, workspaces};
use tenancy_schema::{NewUser, Timestamp, User, UserId, UserPatch};

use crate::sql::{sq_execute, sq_query_map, sq_query_row};
use crate::{Result, Store, StoreError};

impl Store {
    pub fn insert_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn();
        let id = UserId::generate();
        let creation_time = Timestamp::now();
        sq_execute(&conn, users::insert(&id, creation_time, user))?;
        tracing::debug!(user_id = %id, "inserted user");
        Ok(User {
            id,
            creation_time,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        })
    }

    pub fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        load_user(&self.conn(), id)
    }

    /// Users whose email equals `email`, oldest first. Uses `by_email`.
    pub fn users_by_email(&self, email: &str) -> Result<Vec<User>> {
        Ok(sq_query_map(&self.conn(), users::by_email(email), row_to_user)?)
    }

    /// Apply `patch` and return the updated user.
    pub fn patch_user(&self, id: &UserId, patch: &UserPatch) -> Result<User> {
        let conn = self.conn();
        if let Some(built) = users::patch(id, patch) {
            sq_execute(&conn, built)?;
        }
        load_user(&conn, id)?.ok_or_else(|| not_found(id))
    }

    /// Delete a user that owns no workspace and holds no membership.
    pub fn delete_user(&self, id: &UserId) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if !user_exists(&tx, id)? {
            return Err(not_found(id));
        }
        let owned: i64 = sq_query_row(&tx, workspaces::owned_count(id), |row| row.get(0))?;
        let memberships: i64 = sq_query_row(&tx, members::count_for_user(id), |row| row.get(0))?;
        if owned > 0 || memberships > 0 {
            return Err(StoreError::Referenced {
                id: id.clone(),
                workspaces: owned,
                memberships,
            });
        }
        sq_execute(&tx, users::delete(id))?;
        tx.commit()?;
        tracing::debug!(user_id = %id, "deleted user");
        Ok(())
    }
}

pub(crate) fn load_user(conn: &Connection, id: &UserId) -> Result<Option<User>> {
    Ok(sq_query_row(conn, users::get_by_id(id), row_to_user).optional()?)
}

pub(crate) fn user_exists(conn: &Connection, id: &UserId) -> Result<bool> {
    Ok(sq_query_row(conn, users::exists(id), |row| row.get(0))?)
}

fn not_found(id: &UserId) -> StoreError {
    StoreError::NotFound {
        table: USERS,
        id: id.to_string(),
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::from(row.get::<_, String>(0)?),
        creation_time: timestamp_at(row, 1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        image: row.get(4)?,
    })
}

/// Read a non-negative epoch-millisecond column.
pub(crate) fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    let millis: i64 = row.get(idx)?;
    Timestamp::from_millis(millis).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Integer, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::{self, store};
    use crate::StoreError;
    use tenancy_schema::{NewUser, NewWorkspace, UserId, UserPatch};

    #[test]
    fn insert_and_get_user() {
        let store = store();
        let user = store
            .insert_user(&NewUser {
                name: Some("Ada".into()),
                email: None,
                image: Some("https://example.com/ada.png".into()),
            })
            .unwrap();
        assert_eq!(store.get_user(&user.id).unwrap(), Some(user.clone()));
        assert!(store.get_user(&UserId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn users_without_fields_are_allowed() {
        let store = store();
        let user = store.insert_user(&NewUser::default()).unwrap();
        let loaded = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(loaded.name, None);
        assert_eq!(loaded.email, None);
    }

    #[test]
    fn lookup_by_email() {
        let store = store();
        let ada = testing::user(&store, "ada@example.com");
        testing::user(&store, "bob@example.com");
        store.insert_user(&NewUser::default()).unwrap();

        let found = store.users_by_email("ada@example.com").unwrap();
        assert_eq!(found, vec![ada]);
        assert!(store.users_by_email("nobody@example.com").unwrap().is_empty());
    }

    #[test]
    fn email_lookup_uses_index() {
        let store = store();
        let conn = testing::raw(&store);
        let (sql, _) = tenancy_schema::db::users::by_email("x@example.com");
        let plan: Vec<String> = conn
            .prepare(&format!("EXPLAIN QUERY PLAN {sql}"))
            .unwrap()
            .query_map(["x@example.com"], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert!(
            plan.iter().any(|step| step.contains("users_by_email")),
            "{plan:?}"
        );
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let store = store();
        let user = testing::user(&store, "ada@example.com");
        let patched = store
            .patch_user(
                &user.id,
                &UserPatch {
                    name: Some(Some("Ada L.".into())),
                    email: Some(None),
                    image: None,
                },
            )
            .unwrap();
        assert_eq!(patched.name.as_deref(), Some("Ada L."));
        assert_eq!(patched.email, None);
        assert!(store.users_by_email("ada@example.com").unwrap().is_empty());

        let err = store
            .patch_user(&UserId::from("missing"), &UserPatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { table: "users", .. }));
    }

    #[test]
    fn referenced_user_cannot_be_deleted() {
        let store = store();
        let owner = testing::user(&store, "owner@example.com");
        store
            .create_workspace(&NewWorkspace {
                name: "Acme".into(),
                owner_id: owner.id.clone(),
                created_at: testing::ts(1),
            })
            .unwrap();
        let err = store.delete_user(&owner.id).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Referenced {
                workspaces: 1,
                memberships: 1,
                ..
            }
        ));

        let loner = testing::user(&store, "loner@example.com");
        store.delete_user(&loner.id).unwrap();
        assert!(store.get_user(&loner.id).unwrap().is_none());
        assert!(matches!(
            store.delete_user(&loner.id),
            Err(StoreError::NotFound { .. })
        ));
    }
}
