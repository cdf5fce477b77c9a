use utoipa::OpenApi;

use crate::models::client::{
    AuthResponse, ClientListResponse, ClientResponse, Gender, LoginRequest, RefreshResponse,
    RefreshTokenRequest, VerifyEmailRequest, VerifyOtpRequest,
};

/// OpenAPI document covering the client REST endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::clients::register,
        crate::handlers::clients::login,
        crate::handlers::clients::verify_email,
        crate::handlers::clients::verify_otp,
        crate::handlers::clients::verify_email_link,
        crate::handlers::clients::refresh_token,
        crate::handlers::clients::logout,
        crate::handlers::clients::update_profile,
        crate::handlers::clients::current_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::list_clients
    ),
    components(schemas(
        Gender,
        LoginRequest,
        VerifyEmailRequest,
        VerifyOtpRequest,
        RefreshTokenRequest,
        ClientResponse,
        AuthResponse,
        RefreshResponse,
        ClientListResponse
    )),
    tags(
        (name = "Clients", description = "Client registration, verification & token APIs")
    )
)]
pub struct ApiDoc;
