//! HTTP side of jwtgate
//!
//! - Bearer extraction from the `Authorization` header
//! - The auth gate wrapping protected handlers
//! - Login and refresh handlers
//! - A small hyper server exposing them

pub mod bearer;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use bearer::extract_bearer;
pub use handlers::{LoginRequest, RefreshHandler, Routes, MAX_LOGIN_BODY};
pub use middleware::{remote_user, JwtAuth, RemoteUser, REMOTE_USER};
pub use response::{json_response, token_response, unauthorized, BoxBody};
pub use server::GateServer;
