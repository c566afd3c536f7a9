// Session authentication API
// Credential issuance, single-active-session validation and token rotation

pub mod auth;
pub mod config;
pub mod db;
pub mod users;
pub mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    issuance::TokenLifetimes,
    password::{Argon2Hasher, CredentialHasher},
    repository::IdentityStore,
    session_store::SessionStore,
    token::{TokenCodec, TokenKind},
    AuthError, AuthService,
};
use config::AppConfig;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::me_handler,
        users::handlers::list_users_handler,
        users::handlers::get_user_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::SignupResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::TokenPair,
            auth::IdentityResponse,
            TokenKind,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login, refresh and the caller's identity"),
        (name = "users", description = "User directory (requires an access token)")
    ),
    info(
        title = "Session Auth API",
        version = "0.1.0",
        description = "Password authentication with single-active access/refresh token pairs"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Wire the auth core from configuration and a record store backend
pub fn build_service(
    config: &AppConfig,
    backend: Arc<dyn IdentityStore>,
) -> Result<AuthService, AuthError> {
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(&config.password)?);
    let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
    let lifetimes = TokenLifetimes {
        access_secs: config.access_token_ttl_secs,
        refresh_secs: config.refresh_token_ttl_secs,
    };

    Ok(AuthService::new(
        SessionStore::new(backend, config.store_timeout),
        hasher,
        codec,
        lifetimes,
    ))
}

/// Creates and configures the application router
pub fn create_router(service: Arc<AuthService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/me", get(auth::me_handler))
        .route("/users", get(users::list_users_handler))
        .route("/users/:identity_id", get(users::get_user_handler))
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth::require_access_token,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .merge(protected)
        .layer(cors)
        .with_state(service)
}
