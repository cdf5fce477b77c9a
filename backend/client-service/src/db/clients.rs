/// Client collection operations
///
/// Uniqueness of email and phone is enforced by unique indexes created at
/// startup; a concurrent create losing that race surfaces the store's
/// duplicate-key write error as a database failure.
use crate::error::Result;
use crate::models::client::Client;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

const COLLECTION: &str = "clients";

fn collection(db: &Database) -> Collection<Client> {
    db.collection::<Client>(COLLECTION)
}

/// Create the unique indexes on email and phone
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let clients = collection(db);

    clients
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    clients
        .create_index(
            IndexModel::builder()
                .keys(doc! { "phone": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    Ok(())
}

/// Insert a new client record
pub async fn insert(db: &Database, client: &Client) -> Result<()> {
    collection(db).insert_one(client).await?;
    Ok(())
}

/// Find client by id
pub async fn find_by_id(db: &Database, id: &ObjectId) -> Result<Option<Client>> {
    let client = collection(db).find_one(doc! { "_id": id }).await?;
    Ok(client)
}

/// Find client by email
pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Client>> {
    let client = collection(db).find_one(doc! { "email": email }).await?;
    Ok(client)
}

/// Find client by phone
pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Client>> {
    let client = collection(db).find_one(doc! { "phone": phone }).await?;
    Ok(client)
}

/// Overwrite the stored refresh token (login, register)
pub async fn set_refresh_token(
    db: &Database,
    id: &ObjectId,
    refresh_token: &str,
) -> Result<Option<Client>> {
    let updated = collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": { "refreshToken": refresh_token, "updatedAt": DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Rotate the refresh token, conditional on the previously stored value
///
/// The filter includes the presented token so two concurrent rotations with
/// the same stale token cannot both succeed; the loser gets `None`.
pub async fn rotate_refresh_token(
    db: &Database,
    id: &ObjectId,
    presented: &str,
    next: &str,
) -> Result<Option<Client>> {
    let updated = collection(db)
        .find_one_and_update(
            doc! { "_id": id, "refreshToken": presented },
            doc! { "$set": { "refreshToken": next, "updatedAt": DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Null the stored refresh token (logout)
pub async fn clear_refresh_token(db: &Database, id: &ObjectId) -> Result<Option<Client>> {
    let updated = collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": { "refreshToken": Bson::Null, "updatedAt": DateTime::now() } },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Mark a client verified and clear the pending OTP
///
/// `otp` and `otpExpires` are always cleared together, to null.
pub async fn mark_verified(db: &Database, filter: Document) -> Result<Option<Client>> {
    let updated = collection(db)
        .find_one_and_update(
            filter,
            doc! { "$set": {
                "verified": true,
                "otp": Bson::Null,
                "otpExpires": Bson::Null,
                "updatedAt": DateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Mark a client verified via the email-link flow and clear the link token
pub async fn mark_verified_by_link(db: &Database, id: &ObjectId) -> Result<Option<Client>> {
    let updated = collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": {
                "verified": true,
                "verificationToken": Bson::Null,
                "updatedAt": DateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Apply a profile patch ($set document built by the caller)
pub async fn update_profile(
    db: &Database,
    id: &ObjectId,
    mut set: Document,
) -> Result<Option<Client>> {
    set.insert("updatedAt", DateTime::now());
    let updated = collection(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?;
    Ok(updated)
}

/// Count clients matching a filter
pub async fn count(db: &Database, filter: Document) -> Result<u64> {
    let total = collection(db).count_documents(filter).await?;
    Ok(total)
}

/// Fetch one page of clients
pub async fn list(
    db: &Database,
    filter: Document,
    sort: Document,
    skip: u64,
    limit: i64,
) -> Result<Vec<Client>> {
    let mut cursor = collection(db)
        .find(filter)
        .sort(sort)
        .skip(skip)
        .limit(limit)
        .await?;

    let mut clients = Vec::new();
    while let Some(client) = cursor.try_next().await? {
        clients.push(client);
    }
    Ok(clients)
}
