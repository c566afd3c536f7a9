// Authentication module
// Password signup/login, single-active token pair per identity, refresh rotation and the request gate

pub mod error;
pub mod handlers;
pub mod issuance;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod session_store;
pub mod token;
pub mod verification;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, me_handler, refresh_handler, signup_handler};
pub use middleware::{require_access_token, AuthenticatedUser};
pub use models::{
    Identity, IdentityResponse, LoginRequest, LoginResponse, SignupRequest, SignupResponse,
    TokenPair,
};
pub use service::AuthService;
