/// Client handlers - HTTP endpoints for account lifecycle operations
///
/// Token-issuing operations set the `accessToken`/`refreshToken` cookies
/// (http-only, secure); logout clears them. Every body is wrapped in the
/// shared envelope.
use crate::config::Settings;
use crate::error::{ApiError, Result};
use crate::middleware::{ClientId, JwtAuthMiddleware};
use crate::models::client::{
    AuthResponse, ClientListResponse, ClientResponse, Gender, ListClientsQuery, LoginRequest,
    RefreshResponse, RefreshTokenRequest, VerifyEmailRequest, VerifyOtpRequest,
};
use crate::security::TokenPair;
use crate::services::account::{
    AccountService, AvatarFile, ListParams, NewClient, OtpLookup, ProfileUpdate,
};
use crate::validators;
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use error_types::ApiResponse;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

const ACCESS_COOKIE: &str = "accessToken";
const REFRESH_COOKIE: &str = "refreshToken";

/// Registration form (multipart to carry the optional avatar file)
#[derive(Debug, MultipartForm)]
pub struct RegisterForm {
    pub name: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub age: Option<Text<String>>,
    pub gender: Option<Text<String>>,
    pub password: Option<Text<String>>,
    pub phone: Option<Text<String>>,
    #[multipart(limit = "5MB")]
    pub avatar: Option<TempFile>,
}

/// Profile update form; all fields optional
#[derive(Debug, MultipartForm)]
pub struct UpdateProfileForm {
    pub name: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub age: Option<Text<String>>,
    pub gender: Option<Text<String>>,
    pub password: Option<Text<String>>,
    pub phone: Option<Text<String>>,
    #[multipart(limit = "5MB")]
    pub avatar: Option<TempFile>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/clients")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/verify-email", web::post().to(verify_email))
            .route("/refresh-token", web::post().to(refresh_token))
            .route("/verify/{token}", web::get().to(verify_email_link))
            .service(
                web::resource("/logout")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(current_client))
                    .route(web::patch().to(update_profile)),
            )
            .route("", web::get().to(list_clients))
            .route("/{id}/verify-otp", web::post().to(verify_otp))
            .route("/{id}", web::get().to(get_client)),
    );
}

/// Register endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/clients/register",
    tag = "Clients",
    responses(
        (status = 201, description = "Client registered", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate email/phone")
    )
)]
pub async fn register(
    account: web::Data<AccountService>,
    settings: web::Data<Settings>,
    MultipartForm(form): MultipartForm<RegisterForm>,
) -> Result<HttpResponse> {
    let name = require_text(&form.name, "name")?;
    let email = require_text(&form.email, "email")?.to_lowercase();
    let age_raw = require_text(&form.age, "age")?;
    let gender_raw = require_text(&form.gender, "gender")?;
    let password = require_text(&form.password, "password")?;
    let phone = require_text(&form.phone, "phone")?;

    if !validators::validate_email(&email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if !validators::validate_phone(&phone) {
        return Err(ApiError::Validation("Invalid phone number".to_string()));
    }
    let age: i32 = age_raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid age".to_string()))?;
    let gender = Gender::from_str(&gender_raw)
        .ok_or_else(|| ApiError::Validation("Invalid gender".to_string()))?;

    let (client, pair) = account
        .register(NewClient {
            name,
            email,
            age,
            gender,
            password,
            phone,
            avatar: avatar_file(&form.avatar),
        })
        .await?;

    Ok(token_response(
        HttpResponse::Created(),
        201,
        &ClientResponse::from(&client),
        pair,
        &settings,
        "Client registered successfully",
    ))
}

/// Login endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/clients/login",
    tag = "Clients",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Client logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials or unverified account"),
        (status = 404, description = "No client with this email")
    )
)]
pub async fn login(
    account: web::Data<AccountService>,
    settings: web::Data<Settings>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let (client, pair) = account
        .login(&payload.email.to_lowercase(), &payload.password)
        .await?;

    Ok(token_response(
        HttpResponse::Ok(),
        200,
        &ClientResponse::from(&client),
        pair,
        &settings,
        "Client logged in successfully",
    ))
}

/// Email-keyed OTP verification endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/clients/verify-email",
    tag = "Clients",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Client verified", body = ClientResponse),
        (status = 401, description = "Invalid or expired OTP"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn verify_email(
    account: web::Data<AccountService>,
    payload: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let client = account
        .verify_otp(OtpLookup::Email(payload.email.to_lowercase()), &payload.otp)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        ClientResponse::from(&client),
        "Client verified successfully",
    )))
}

/// Id-keyed OTP verification endpoint handler; also issues a token pair
#[utoipa::path(
    post,
    path = "/api/v1/clients/{id}/verify-otp",
    tag = "Clients",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Client verified", body = AuthResponse),
        (status = 401, description = "Invalid or expired OTP"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn verify_otp(
    account: web::Data<AccountService>,
    settings: web::Data<Settings>,
    id: web::Path<String>,
    payload: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;
    let id = parse_object_id(&id)?;

    let (client, pair) = account.verify_otp_with_tokens(id, &payload.otp).await?;

    Ok(token_response(
        HttpResponse::Ok(),
        200,
        &ClientResponse::from(&client),
        pair,
        &settings,
        "Client verified successfully",
    ))
}

/// Email-link verification endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/clients/verify/{token}",
    tag = "Clients",
    responses(
        (status = 200, description = "Client verified", body = ClientResponse),
        (status = 401, description = "Invalid or expired verification token")
    )
)]
pub async fn verify_email_link(
    account: web::Data<AccountService>,
    token: web::Path<String>,
) -> Result<HttpResponse> {
    let client = account.verify_email_link(&token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        ClientResponse::from(&client),
        "Client verified successfully",
    )))
}

/// Refresh token endpoint handler; token arrives via cookie or body
#[utoipa::path(
    post,
    path = "/api/v1/clients/refresh-token",
    tag = "Clients",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, or mismatched refresh token")
    )
)]
pub async fn refresh_token(
    account: web::Data<AccountService>,
    settings: web::Data<Settings>,
    req: HttpRequest,
    payload: Option<web::Json<RefreshTokenRequest>>,
) -> Result<HttpResponse> {
    let presented = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| payload.as_ref().and_then(|p| p.refresh_token.clone()))
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".to_string()))?;

    let (_client, pair) = account.refresh(&presented).await?;

    let body = ApiResponse::new(
        200,
        RefreshResponse {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        },
        "Tokens refreshed successfully",
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(
            ACCESS_COOKIE,
            &pair.access_token,
            settings.jwt.access_ttl_secs,
            settings.cookies.secure,
        ))
        .cookie(token_cookie(
            REFRESH_COOKIE,
            &pair.refresh_token,
            settings.jwt.refresh_ttl_secs,
            settings.cookies.secure,
        ))
        .json(body))
}

/// Logout endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/clients/logout",
    tag = "Clients",
    responses(
        (status = 200, description = "Client logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    account: web::Data<AccountService>,
    client_id: ClientId,
) -> Result<HttpResponse> {
    account.logout(&client_id.0).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_COOKIE))
        .cookie(removal_cookie(REFRESH_COOKIE))
        .json(ApiResponse::new(
            200,
            serde_json::json!({}),
            "Logged out successfully",
        )))
}

/// Profile update endpoint handler
#[utoipa::path(
    patch,
    path = "/api/v1/clients/me",
    tag = "Clients",
    responses(
        (status = 200, description = "Profile updated", body = ClientResponse),
        (status = 400, description = "Invalid input or duplicate email/phone"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_profile(
    account: web::Data<AccountService>,
    client_id: ClientId,
    MultipartForm(form): MultipartForm<UpdateProfileForm>,
) -> Result<HttpResponse> {
    let mut update = ProfileUpdate::default();

    if let Some(name) = optional_text(&form.name, "name")? {
        update.name = Some(name);
    }
    if let Some(email) = optional_text(&form.email, "email")? {
        let email = email.to_lowercase();
        if !validators::validate_email(&email) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        update.email = Some(email);
    }
    if let Some(phone) = optional_text(&form.phone, "phone")? {
        if !validators::validate_phone(&phone) {
            return Err(ApiError::Validation("Invalid phone number".to_string()));
        }
        update.phone = Some(phone);
    }
    if let Some(age) = optional_text(&form.age, "age")? {
        update.age = Some(
            age.trim()
                .parse()
                .map_err(|_| ApiError::Validation("Invalid age".to_string()))?,
        );
    }
    if let Some(gender) = optional_text(&form.gender, "gender")? {
        update.gender = Some(
            Gender::from_str(&gender)
                .ok_or_else(|| ApiError::Validation("Invalid gender".to_string()))?,
        );
    }
    if let Some(password) = optional_text(&form.password, "password")? {
        update.password = Some(password);
    }
    update.avatar = avatar_file(&form.avatar);

    let client = account.update_profile(&client_id.0, update).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        ClientResponse::from(&client),
        "Profile updated successfully",
    )))
}

/// Current client endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/clients/me",
    tag = "Clients",
    responses(
        (status = 200, description = "Current client", body = ClientResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn current_client(
    account: web::Data<AccountService>,
    client_id: ClientId,
) -> Result<HttpResponse> {
    let client = account.get(&client_id.0).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        ClientResponse::from(&client),
        "Client fetched successfully",
    )))
}

/// Get client by id endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    responses(
        (status = 200, description = "Client found", body = ClientResponse),
        (status = 400, description = "Invalid client id"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn get_client(
    account: web::Data<AccountService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&id)?;
    let client = account.get(&id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        ClientResponse::from(&client),
        "Client fetched successfully",
    )))
}

/// Listing endpoint handler with pagination, filters, and sort
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = "Clients",
    params(ListClientsQuery),
    responses(
        (status = 200, description = "Paginated clients", body = ClientListResponse)
    )
)]
pub async fn list_clients(
    account: web::Data<AccountService>,
    query: web::Query<ListClientsQuery>,
) -> Result<HttpResponse> {
    let gender = match query.gender.as_deref() {
        Some(raw) => Some(
            Gender::from_str(raw)
                .ok_or_else(|| ApiError::Validation("Invalid gender filter".to_string()))?,
        ),
        None => None,
    };

    let page = account
        .list(ListParams {
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(10),
            verified: query.verified,
            gender,
            sort_by: query.sort_by.clone(),
            ascending: matches!(query.sort_order.as_deref(), Some("asc")),
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        page,
        "Clients fetched successfully",
    )))
}

// ========== Helpers ==========

fn require_text(field: &Option<Text<String>>, name: &str) -> Result<String> {
    match field {
        Some(text) if !validators::is_blank(&text.0) => Ok(text.0.clone()),
        _ => Err(ApiError::Validation(format!("{} is required", name))),
    }
}

fn optional_text(field: &Option<Text<String>>, name: &str) -> Result<Option<String>> {
    match field {
        Some(text) if validators::is_blank(&text.0) => {
            Err(ApiError::Validation(format!("{} must not be blank", name)))
        }
        Some(text) => Ok(Some(text.0.clone())),
        None => Ok(None),
    }
}

fn avatar_file(file: &Option<TempFile>) -> Option<AvatarFile> {
    file.as_ref().map(|f| AvatarFile {
        path: f.file.path().to_path_buf(),
        content_type: f.content_type.as_ref().map(|m| m.to_string()),
    })
}

fn parse_object_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::Validation("Invalid client id".to_string()))
}

fn token_cookie(name: &'static str, value: &str, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value.to_string())
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(ttl_secs))
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

fn token_response(
    mut builder: actix_web::HttpResponseBuilder,
    status: u16,
    client: &ClientResponse,
    pair: TokenPair,
    settings: &Settings,
    message: &str,
) -> HttpResponse {
    builder
        .cookie(token_cookie(
            ACCESS_COOKIE,
            &pair.access_token,
            settings.jwt.access_ttl_secs,
            settings.cookies.secure,
        ))
        .cookie(token_cookie(
            REFRESH_COOKIE,
            &pair.refresh_token,
            settings.jwt.refresh_ttl_secs,
            settings.cookies.secure,
        ))
        .json(ApiResponse::new(
            status,
            AuthResponse {
                client: client.clone(),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            message,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookies_are_http_only_and_secure() {
        let cookie = token_cookie(ACCESS_COOKIE, "token-value", 900, true);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(REFRESH_COOKIE);
        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    #[test]
    fn object_id_parsing_rejects_garbage() {
        assert!(parse_object_id("not-an-id").is_err());
        assert!(parse_object_id("507f1f77bcf86cd799439011").is_ok());
    }
}
