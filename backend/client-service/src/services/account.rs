/// Account lifecycle orchestration
///
/// Composes the repositories, token service, hasher, notification
/// transports, and blob storage behind the HTTP handlers. Every inbound
/// request is handled independently; the only shared state is the
/// once-constructed collaborators held here.
use crate::db;
use crate::error::{ApiError, Result};
use crate::models::client::{Client, ClientListResponse, ClientResponse, Gender, PageMeta};
use crate::security::password::{hash_password, verify_password};
use crate::security::{TokenPair, TokenService};
use crate::services::email::EmailService;
use crate::services::otp;
use crate::services::sms::SmsService;
use crate::services::storage::AvatarStorage;
use mongodb::bson::{oid::ObjectId, DateTime, Document};
use mongodb::Database;
use std::path::PathBuf;
use tracing::info;

/// Sort fields accepted by the listing endpoint
const SORT_FIELDS: &[&str] = &["createdAt", "updatedAt", "name", "email", "age"];
const DEFAULT_SORT_FIELD: &str = "createdAt";

/// New registration input
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
    pub password: String,
    pub phone: String,
    pub avatar: Option<AvatarFile>,
}

/// A client-supplied file sitting in temp storage
pub struct AvatarFile {
    pub path: PathBuf,
    pub content_type: Option<String>,
}

/// Profile patch; absent fields are left untouched
#[derive(Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<AvatarFile>,
}

/// OTP verification lookup key (the two public entry points)
pub enum OtpLookup {
    Email(String),
    Id(ObjectId),
}

/// Listing parameters after query normalization
pub struct ListParams {
    pub page: u64,
    pub limit: i64,
    pub verified: Option<bool>,
    pub gender: Option<Gender>,
    pub sort_by: Option<String>,
    pub ascending: bool,
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
    tokens: TokenService,
    email: EmailService,
    sms: SmsService,
    storage: AvatarStorage,
}

impl AccountService {
    pub fn new(
        db: Database,
        tokens: TokenService,
        email: EmailService,
        sms: SmsService,
        storage: AvatarStorage,
    ) -> Self {
        Self {
            db,
            tokens,
            email,
            sms,
            storage,
        }
    }

    /// Register a new, unverified client
    ///
    /// Sends the OTP through both channels, persists the record, then
    /// issues and persists the first token pair.
    pub async fn register(&self, input: NewClient) -> Result<(Client, TokenPair)> {
        if db::clients::find_by_email(&self.db, &input.email)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        if db::clients::find_by_phone(&self.db, &input.phone)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let avatar_url = match &input.avatar {
            Some(file) => {
                self.storage
                    .upload(&file.path, file.content_type.as_deref())
                    .await?
            }
            None => None,
        };

        let (code, otp_expires) = otp::generate();
        let now = DateTime::now();
        let mut client = Client {
            id: ObjectId::new(),
            name: input.name,
            email: input.email,
            age: input.age,
            gender: input.gender,
            password: hash_password(&input.password)?,
            phone: input.phone,
            avatar: avatar_url,
            verified: false,
            refresh_token: None,
            verification_token: None,
            token_version: 0,
            otp: Some(code.clone()),
            otp_expires: Some(otp_expires),
            created_at: now,
            updated_at: now,
        };
        client.verification_token = Some(self.tokens.issue_verification_token(&client)?);

        self.email.send_otp_email(&client.email, &code).await?;
        self.sms.send_otp(&client.phone, &code).await?;

        db::clients::insert(&self.db, &client).await?;

        let (client, pair) = self.issue_pair(&client).await?;

        info!(client_id = %client.id, "client registered");
        Ok((client, pair))
    }

    /// Password login; requires a verified account
    pub async fn login(&self, email: &str, login_password: &str) -> Result<(Client, TokenPair)> {
        let client = db::clients::find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound("No client registered with this email".to_string())
            })?;

        if !verify_password(login_password, &client.password)? {
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if !client.verified {
            return Err(ApiError::Unauthorized("Account not verified".to_string()));
        }

        let (client, pair) = self.issue_pair(&client).await?;

        info!(client_id = %client.id, "client logged in");
        Ok((client, pair))
    }

    /// Verify a pending OTP, keyed by email or by id
    ///
    /// On success the code and its expiry are cleared together and the
    /// account becomes verified.
    pub async fn verify_otp(&self, lookup: OtpLookup, code: &str) -> Result<Client> {
        let client = match &lookup {
            OtpLookup::Email(email) => db::clients::find_by_email(&self.db, email).await?,
            OtpLookup::Id(id) => db::clients::find_by_id(&self.db, id).await?,
        }
        .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        otp::verify(client.otp.as_deref(), client.otp_expires, code)?;

        let updated = db::clients::mark_verified(&self.db, mongodb::bson::doc! { "_id": client.id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        info!(client_id = %updated.id, "client verified via OTP");
        Ok(updated)
    }

    /// Id-keyed OTP verification that also issues a fresh token pair
    pub async fn verify_otp_with_tokens(
        &self,
        id: ObjectId,
        code: &str,
    ) -> Result<(Client, TokenPair)> {
        let client = self.verify_otp(OtpLookup::Id(id), code).await?;
        self.issue_pair(&client).await
    }

    /// Verify via the signed email-link token
    pub async fn verify_email_link(&self, token: &str) -> Result<Client> {
        let id = self.tokens.verify_verification_token(token)?;

        let updated = db::clients::mark_verified_by_link(&self.db, &id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        info!(client_id = %updated.id, "client verified via email link");
        Ok(updated)
    }

    /// Drop the stored refresh token
    pub async fn logout(&self, id: &ObjectId) -> Result<()> {
        db::clients::clear_refresh_token(&self.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        info!(client_id = %id, "client logged out");
        Ok(())
    }

    /// Exchange a refresh token for a rotated pair
    ///
    /// The presented token must byte-equal the stored one; the rotation is
    /// conditional on that value so a stale token can never win twice.
    pub async fn refresh(&self, presented: &str) -> Result<(Client, TokenPair)> {
        let id = self.tokens.verify_refresh_token(presented)?;

        let client = db::clients::find_by_id(&self.db, &id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        let next = self.tokens.issue_refresh_token(&client)?;
        let updated = db::clients::rotate_refresh_token(&self.db, &id, presented, &next)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Refresh token mismatch".to_string()))?;

        let access_token = self.tokens.issue_access_token(&updated)?;

        info!(client_id = %updated.id, "tokens rotated");
        Ok((
            updated,
            TokenPair {
                access_token,
                refresh_token: next,
            },
        ))
    }

    /// Apply a profile patch
    ///
    /// Email/phone changes re-check uniqueness against other records; a
    /// supplied password is re-hashed before persisting.
    pub async fn update_profile(&self, id: &ObjectId, update: ProfileUpdate) -> Result<Client> {
        let current = db::clients::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        let mut set = Document::new();

        if let Some(name) = update.name {
            set.insert("name", name);
        }

        if let Some(email) = update.email {
            if email != current.email {
                if db::clients::find_by_email(&self.db, &email).await?.is_some() {
                    return Err(ApiError::Conflict("Email already registered".to_string()));
                }
                set.insert("email", email);
            }
        }

        if let Some(phone) = update.phone {
            if phone != current.phone {
                if db::clients::find_by_phone(&self.db, &phone).await?.is_some() {
                    return Err(ApiError::Conflict(
                        "Phone number already registered".to_string(),
                    ));
                }
                set.insert("phone", phone);
            }
        }

        if let Some(age) = update.age {
            set.insert("age", age);
        }

        if let Some(gender) = update.gender {
            set.insert("gender", gender.as_str());
        }

        if let Some(new_password) = update.password {
            set.insert("password", hash_password(&new_password)?);
        }

        if let Some(file) = &update.avatar {
            if let Some(url) = self
                .storage
                .upload(&file.path, file.content_type.as_deref())
                .await?
            {
                set.insert("avatar", url);
            }
        }

        if set.is_empty() {
            return Ok(current);
        }

        let updated = db::clients::update_profile(&self.db, id, set)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        info!(client_id = %updated.id, "profile updated");
        Ok(updated)
    }

    /// Fetch one client by id
    pub async fn get(&self, id: &ObjectId) -> Result<Client> {
        db::clients::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))
    }

    /// Paginated listing with optional filters and sort
    pub async fn list(&self, params: ListParams) -> Result<ClientListResponse> {
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 100);

        let mut filter = Document::new();
        if let Some(verified) = params.verified {
            filter.insert("verified", verified);
        }
        if let Some(gender) = params.gender {
            filter.insert("gender", gender.as_str());
        }

        let mut sort = Document::new();
        sort.insert(
            sort_field(params.sort_by.as_deref()),
            if params.ascending { 1 } else { -1 },
        );

        let total = db::clients::count(&self.db, filter.clone()).await?;
        let skip = (page - 1) * limit as u64;
        let clients = db::clients::list(&self.db, filter, sort, skip, limit).await?;

        let meta = PageMeta::compute(total, page, limit);
        Ok(ClientListResponse {
            clients: clients.iter().map(ClientResponse::from).collect(),
            total,
            page,
            limit,
            total_pages: meta.total_pages,
            has_next_page: meta.has_next_page,
            has_prev_page: meta.has_prev_page,
        })
    }

    /// Sign a fresh pair and persist the refresh half on the record
    async fn issue_pair(&self, client: &Client) -> Result<(Client, TokenPair)> {
        let access_token = self.tokens.issue_access_token(client)?;
        let refresh_token = self.tokens.issue_refresh_token(client)?;

        let updated = db::clients::set_refresh_token(&self.db, &client.id, &refresh_token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

        Ok((
            updated,
            TokenPair {
                access_token,
                refresh_token,
            },
        ))
    }
}

/// Resolve the sort field, falling back to creation time
fn sort_field(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|field| SORT_FIELDS.iter().find(|f| **f == field))
        .copied()
        .unwrap_or(DEFAULT_SORT_FIELD)
}
