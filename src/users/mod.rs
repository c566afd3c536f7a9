// User directory endpoints (protected)

pub mod handlers;

pub use handlers::{get_user_handler, list_users_handler};
