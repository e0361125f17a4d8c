//! Compile-time–checked column identifiers for all tables.
//!
//! Names are the schema's own names, so `users.email` and
//! `workspaceMembers.workspaceId` appear in SQL exactly as declared.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "_id"]
    Id,
    #[iden = "_creationTime"]
    CreationTime,
    Name,
    Email,
    Image,
}

#[derive(Iden)]
pub enum Workspaces {
    Table,
    #[iden = "_id"]
    Id,
    #[iden = "_creationTime"]
    CreationTime,
    Name,
    #[iden = "ownerId"]
    OwnerId,
    #[iden = "createdAt"]
    CreatedAt,
}

#[derive(Iden)]
pub enum WorkspaceMembers {
    #[iden = "workspaceMembers"]
    Table,
    #[iden = "_id"]
    Id,
    #[iden = "_creationTime"]
    CreationTime,
    #[iden = "workspaceId"]
    WorkspaceId,
    #[iden = "userId"]
    UserId,
    Role,
    #[iden = "joinedAt"]
    JoinedAt,
}

/// Opaque store for one auth-provider table.
#[derive(Iden)]
pub enum AuthDocuments {
    #[iden = "_id"]
    Id,
    #[iden = "_creationTime"]
    CreationTime,
    Document,
}
