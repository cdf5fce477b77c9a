/// Client Service - HTTP Server
///
/// Starts the REST API with:
/// - MongoDB connection + unique-index bootstrap
/// - Email service (SMTP, no-op mode when unconfigured)
/// - SMS service (AWS SNS, dev mode when unconfigured)
/// - Avatar storage (S3, disabled mode when unconfigured)
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use client_service::config::Settings;
use client_service::db;
use client_service::openapi::ApiDoc;
use client_service::security::TokenService;
use client_service::services::{AccountService, AvatarStorage, EmailService, SmsService};
use client_service::handlers;
use mongodb::Client as MongoClient;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "client_service=info,info".into()),
        )
        .with_target(false)
        .init();

    info!("Starting Client Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Connect to MongoDB
    let mongo = MongoClient::with_uri_str(&settings.database.uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let database = mongo.database(&settings.database.database);

    db::clients::ensure_indexes(&database)
        .await
        .context("Failed to create unique indexes")?;
    info!(
        "MongoDB initialized (database: {})",
        settings.database.database
    );

    // Initialize email service
    let email_service =
        EmailService::new(&settings.email).context("Failed to initialize email service")?;
    if email_service.is_enabled() {
        info!("Email service initialized with SMTP");
    } else {
        info!("Email service running in no-op mode (SMTP not configured)");
    }

    // Initialize AWS clients (optional)
    let (sms_service, avatar_storage) = if std::env::var("AWS_REGION").is_ok() {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let sns_client = aws_sdk_sns::Client::new(&aws_config);
        info!("AWS SNS client initialized for OTP SMS delivery");

        let s3_client = if settings.storage.bucket.is_some() {
            info!("AWS S3 client initialized for avatar storage");
            Some(aws_sdk_s3::Client::new(&aws_config))
        } else {
            info!("S3 bucket not configured; avatar storage disabled");
            None
        };

        (
            SmsService::new(Some(sns_client)),
            AvatarStorage::new(s3_client, &settings.storage),
        )
    } else {
        info!("AWS region not configured; SMS delivery and avatar storage run in dev mode");
        (
            SmsService::new(None),
            AvatarStorage::new(None, &settings.storage),
        )
    };

    // Construct once-shared collaborators
    let token_service = TokenService::new(&settings.jwt);
    let account_service = AccountService::new(
        database,
        token_service.clone(),
        email_service,
        sms_service,
        avatar_storage,
    );

    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let cors_origins = settings.server.cors_allowed_origins.clone();
    let app_settings = settings.clone();

    HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(app_settings.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api/v1/openapi.json", ApiDoc::openapi()),
            )
            .route("/health", web::get().to(health_check))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Client service shutdown complete");

    Ok(())
}

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
