use crate::error::ApiError;
use crate::security::TokenService;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, Ready};
use mongodb::bson::oid::ObjectId;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Client ID extracted from a validated access token
#[derive(Debug, Clone, Copy)]
pub struct ClientId(pub ObjectId);

/// JWT Authentication Middleware
///
/// Validates the Bearer access token against the app's `TokenService` and
/// injects `ClientId` into request extensions.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let tokens = req
                .app_data::<web::Data<TokenService>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(ApiError::Internal(
                        "Token service not configured".to_string(),
                    ))
                })?;

            // Extract Authorization header
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    Error::from(ApiError::Unauthorized(
                        "Missing Authorization header".to_string(),
                    ))
                })?;

            let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                Error::from(ApiError::Unauthorized(
                    "Invalid Authorization header format".to_string(),
                ))
            })?;

            let claims = tokens.verify_access_token(token).map_err(|e| {
                tracing::warn!("JWT validation failed: {}", e);
                Error::from(e)
            })?;

            let client_id = ObjectId::parse_str(&claims.sub).map_err(|_| {
                Error::from(ApiError::Unauthorized(
                    "Invalid token subject".to_string(),
                ))
            })?;

            // Insert ClientId into request extensions
            req.extensions_mut().insert(ClientId(client_id));

            service.call(req).await
        })
    }
}

/// FromRequest implementation for ClientId
impl actix_web::FromRequest for ClientId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<ClientId>() {
            Some(client_id) => ready(Ok(*client_id)),
            None => ready(Err(Error::from(ApiError::Unauthorized(
                "Client not authenticated".to_string(),
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{test_client, test_token_service};
    use actix_web::{test, App, HttpResponse};

    async fn whoami(client_id: ClientId) -> HttpResponse {
        HttpResponse::Ok().body(client_id.0.to_hex())
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let tokens = test_token_service();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(tokens))
                .service(
                    web::resource("/whoami")
                        .wrap(JwtAuthMiddleware)
                        .route(web::get().to(whoami)),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_bearer_token_passes_and_extracts_id() {
        let tokens = test_token_service();
        let client = test_client();
        let access = tokens.issue_access_token(&client).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(tokens))
                .service(
                    web::resource("/whoami")
                        .wrap(JwtAuthMiddleware)
                        .route(web::get().to(whoami)),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", access)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let body = test::read_body(res).await;
        assert_eq!(body, client.id.to_hex().as_bytes());
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let tokens = test_token_service();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(tokens))
                .service(
                    web::resource("/whoami")
                        .wrap(JwtAuthMiddleware)
                        .route(web::get().to(whoami)),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
