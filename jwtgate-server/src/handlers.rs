//! Login, refresh and the demo routes

use crate::bearer::extract_bearer;
use crate::middleware::{remote_user, JwtAuth};
use crate::response::{json_response, token_response, unauthorized, BoxBody};
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use jwtgate_core::{AuthError, JwtConfig};
use serde::Deserialize;
use serde_json::json;
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, info};

/// Largest login body read before the request is rejected
pub const MAX_LOGIN_BODY: usize = 16 * 1024;

/// Login request body. Missing fields decode as empty strings and are then
/// rejected like any other bad credential.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl JwtAuth {
    /// Issuance handler: `{"username","password"}` in, `{"token"}` out.
    pub async fn login<B>(&self, request: Request<B>) -> Response<BoxBody>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        match self.issue_token(request).await {
            Ok((username, token)) => {
                info!(user = %username, "Issued token");
                token_response(&token)
            }
            Err(err) => {
                debug!(reason = %err, "Rejected login");
                self.unauthorized()
            }
        }
    }

    async fn issue_token<B>(&self, request: Request<B>) -> Result<(String, String), AuthError>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let body = match Limited::new(request.into_body(), MAX_LOGIN_BODY).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                debug!(error = %err, "Failed to read login body");
                return Err(AuthError::Malformed);
            }
        };
        let login: LoginRequest =
            serde_json::from_slice(&body).map_err(|_| AuthError::Malformed)?;

        if login.username.is_empty() {
            return Err(AuthError::CredentialRejected);
        }
        if !self
            .config()
            .authenticator()
            .authenticate(&login.username, &login.password)
            .await
        {
            return Err(AuthError::CredentialRejected);
        }

        let token = self.config().codec().mint(&login.username, None)?;
        Ok((login.username, token))
    }
}

/// Issues a replacement token for a still-valid one, within the sliding
/// refresh window. Obtained from [`JwtAuth::refresh_handler`].
#[derive(Debug, Clone)]
pub struct RefreshHandler {
    config: Arc<JwtConfig>,
}

impl RefreshHandler {
    pub(crate) fn new(config: Arc<JwtConfig>) -> Self {
        RefreshHandler { config }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Response<BoxBody> {
        match self.refresh_token(request.headers()) {
            Ok(token) => {
                if let Some(user) = remote_user(&request) {
                    info!(%user, "Refreshed token");
                }
                token_response(&token)
            }
            Err(err) => {
                debug!(reason = %err, "Rejected refresh");
                unauthorized(&self.config)
            }
        }
    }

    /// Re-verify the presented token and mint its replacement
    pub fn refresh_token(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let codec = self.config.codec();
        let token = extract_bearer(headers)?;
        let claims = codec.verify(token)?;
        codec.refresh(&claims, self.config.max_refresh())
    }
}

/// Router for the shipped server
#[derive(Debug, Clone)]
pub struct Routes {
    auth: JwtAuth,
    refresh: Option<RefreshHandler>,
}

impl Routes {
    /// Refresh is mounted only when the configuration allows it
    pub fn new(auth: JwtAuth) -> Self {
        let refresh = auth.refresh_handler().ok();
        Routes { auth, refresh }
    }

    pub fn auth(&self) -> &JwtAuth {
        &self.auth
    }

    pub fn refresh_mounted(&self) -> bool {
        self.refresh.is_some()
    }

    pub async fn dispatch<B>(&self, request: Request<B>) -> Response<BoxBody>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        debug!(%method, %path, "Handling request");

        match (&method, path.as_str()) {
            (&Method::GET, "/health") => health(),
            (&Method::POST, "/login") => self.auth.login(request).await,
            (&Method::GET, "/auth/hello") => self.auth.gate(request, hello).await,
            (&Method::GET | &Method::POST, "/auth/refresh_token") => match &self.refresh {
                Some(refresh) => {
                    self.auth
                        .gate(request, |request| refresh.handle(request))
                        .await
                }
                None => not_found(),
            },
            _ => not_found(),
        }
    }
}

async fn hello<B>(request: Request<B>) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "id": remote_user(&request),
            "text": "Hello World.",
        }),
    )
}

fn health() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "service": "jwtgate",
        }),
    )
}

fn not_found() -> Response<BoxBody> {
    json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not found" }))
}
