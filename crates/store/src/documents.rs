//! Schema-validated JSON documents on top of the typed operations.

use rusqlite::OptionalExtension;
use serde_json::{Map, Value};
use tenancy_schema::app::{USERS, WORKSPACE_MEMBERS, WORKSPACES};
use tenancy_schema::db::auth;
use tenancy_schema::define::{CREATION_TIME_FIELD, ID_FIELD};
use tenancy_schema::validate::json_type;
use tenancy_schema::{
    NewUser, NewWorkspace, NewWorkspaceMember, Timestamp, UserId, ValidationError, WorkspaceId,
    WorkspaceMemberId,
};

use crate::sql::{sq_execute, sq_query_row};
use crate::users::timestamp_at;
use crate::{Result, Store, StoreError};

impl Store {
    /// Validate `document` against `table` and insert it.
    ///
    /// Returns the stored document including `_id` and `_creationTime`.
    /// Inserting into `workspaces` also adds the owner as admin.
    pub fn insert_document(&self, table: &str, document: &Value) -> Result<Value> {
        reject_system_fields(document)?;
        if self.schema().is_auth_table(table) {
            let (id, creation_time) = self.store_auth_document(table, document)?;
            return Ok(with_system_fields(document, id, creation_time));
        }

        self.schema()
            .validate(table, document)
            .map_err(|errors| invalid(table, errors))?;

        let stored = match table {
            USERS => {
                let user: NewUser = serde_json::from_value(document.clone())?;
                serde_json::to_value(self.insert_user(&user)?)?
            }
            WORKSPACES => {
                let workspace: NewWorkspace = serde_json::from_value(document.clone())?;
                serde_json::to_value(self.create_workspace(&workspace)?.workspace)?
            }
            WORKSPACE_MEMBERS => {
                let member: NewWorkspaceMember = serde_json::from_value(document.clone())?;
                serde_json::to_value(self.add_member(&member)?)?
            }
            other => return Err(StoreError::UnknownTable(other.to_string())),
        };
        Ok(stored)
    }

    /// Fetch any document by table and `_id`.
    pub fn get_document(&self, table: &str, id: &str) -> Result<Option<Value>> {
        if self.schema().is_auth_table(table) {
            return self.get_auth_document(table, id);
        }
        let value = match table {
            USERS => self
                .get_user(&UserId::from(id))?
                .map(serde_json::to_value)
                .transpose()?,
            WORKSPACES => self
                .get_workspace(&WorkspaceId::from(id))?
                .map(serde_json::to_value)
                .transpose()?,
            WORKSPACE_MEMBERS => self
                .get_member(&WorkspaceMemberId::from(id))?
                .map(serde_json::to_value)
                .transpose()?,
            other => return Err(StoreError::UnknownTable(other.to_string())),
        };
        Ok(value)
    }

    /// Store an opaque auth-table document. Returns its `_id`.
    pub fn put_auth_document(&self, table: &str, document: &Value) -> Result<String> {
        reject_system_fields(document)?;
        Ok(self.store_auth_document(table, document)?.0)
    }

    fn store_auth_document(&self, table: &str, document: &Value) -> Result<(String, Timestamp)> {
        self.require_auth_table(table)?;
        if !document.is_object() {
            return Err(invalid(
                table,
                vec![ValidationError::NotAnObject {
                    found: json_type(document).to_string(),
                }],
            ));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let creation_time = Timestamp::now();
        let body = serde_json::to_string(document)?;
        sq_execute(&self.conn(), auth::insert(table, &id, creation_time, &body))?;
        tracing::debug!(table, id = %id, "stored auth document");
        Ok((id, creation_time))
    }

    pub fn get_auth_document(&self, table: &str, id: &str) -> Result<Option<Value>> {
        self.require_auth_table(table)?;
        let row = sq_query_row(&self.conn(), auth::get_by_id(table, id), |row| {
            Ok((
                row.get::<_, String>(0)?,
                timestamp_at(row, 1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .optional()?;
        let Some((id, creation_time, body)) = row else {
            return Ok(None);
        };
        let document: Value = serde_json::from_str(&body)?;
        Ok(Some(with_system_fields(&document, id, creation_time)))
    }

    fn require_auth_table(&self, table: &str) -> Result<()> {
        if self.schema().is_auth_table(table) {
            Ok(())
        } else {
            Err(StoreError::UnknownTable(table.to_string()))
        }
    }
}

fn reject_system_fields(document: &Value) -> Result<()> {
    for field in [ID_FIELD, CREATION_TIME_FIELD] {
        if document.get(field).is_some() {
            return Err(StoreError::SystemField { field });
        }
    }
    Ok(())
}

fn invalid(table: &str, errors: Vec<ValidationError>) -> StoreError {
    StoreError::Invalid {
        table: table.to_string(),
        errors,
    }
}

fn with_system_fields(document: &Value, id: String, creation_time: Timestamp) -> Value {
    let mut object: Map<String, Value> = document.as_object().cloned().unwrap_or_default();
    object.insert(ID_FIELD.to_string(), Value::String(id));
    object.insert(
        CREATION_TIME_FIELD.to_string(),
        Value::from(creation_time.as_millis()),
    );
    Value::Object(object)
}
