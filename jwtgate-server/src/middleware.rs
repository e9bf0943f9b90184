//! Auth gate middleware
//!
//! Every gated request goes through one pass of:
//! 1. Extract the bearer token from the `Authorization` header
//! 2. Verify signature and expiry with the configured codec
//! 3. Ask the authorizator whether the identity may perform the request
//! 4. Attach the identity to the request extensions and call the handler
//!
//! Any failure short-circuits to the configured unauthorized response and the
//! wrapped handler is never invoked.

use crate::bearer::extract_bearer;
use crate::response::{unauthorized, BoxBody};
use hyper::{Request, Response};
use jwtgate_core::{AuthError, ConfigError, JwtConfig};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Well-known name under which the authenticated identity is exposed
pub const REMOTE_USER: &str = "REMOTE_USER";

/// Authenticated identity, stored in the request extensions by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser(pub String);

impl RemoteUser {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity attached by the gate, if the request passed through it
pub fn remote_user<B>(request: &Request<B>) -> Option<&str> {
    request
        .extensions()
        .get::<RemoteUser>()
        .map(RemoteUser::as_str)
}

/// The JWT middleware: shared, read-only configuration plus the gate,
/// login and refresh entry points.
#[derive(Debug, Clone)]
pub struct JwtAuth {
    config: Arc<JwtConfig>,
}

impl JwtAuth {
    pub fn new(config: JwtConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<JwtConfig>) -> Self {
        JwtAuth { config }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> Arc<JwtConfig> {
        Arc::clone(&self.config)
    }

    /// Run the gate checks and return the request with [`RemoteUser`]
    /// attached.
    pub async fn authenticate<B>(&self, request: Request<B>) -> Result<Request<B>, AuthError> {
        let token = extract_bearer(request.headers())?;
        let claims = self.config.codec().verify(token)?;

        let (mut parts, body) = request.into_parts();
        if !self
            .config
            .authorizator()
            .authorize(&claims.identity, &parts)
            .await
        {
            return Err(AuthError::AuthorizationDenied);
        }

        parts.extensions.insert(RemoteUser(claims.identity));
        Ok(Request::from_parts(parts, body))
    }

    /// Gate `handler` behind token verification and authorization.
    pub async fn gate<B, F, Fut>(&self, request: Request<B>, handler: F) -> Response<BoxBody>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<BoxBody>>,
    {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.authenticate(request).await {
            Ok(request) => handler(request).await,
            Err(err) => {
                debug!(%method, %path, reason = %err, "Rejected gated request");
                self.unauthorized()
            }
        }
    }

    pub fn unauthorized(&self) -> Response<BoxBody> {
        unauthorized(&self.config)
    }

    /// Handler for token refresh. Fails when `max_refresh` is zero, so a
    /// router can never mount refresh for a non-refreshable configuration.
    pub fn refresh_handler(&self) -> Result<crate::handlers::RefreshHandler, ConfigError> {
        if !self.config.refresh_enabled() {
            return Err(ConfigError::RefreshDisabled);
        }
        Ok(crate::handlers::RefreshHandler::new(self.shared_config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::json_response;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::header::AUTHORIZATION;
    use hyper::http::request::Parts;
    use hyper::StatusCode;
    use jwtgate_core::test_utils::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn auth() -> JwtAuth {
        JwtAuth::new(test_config_builder().build().unwrap())
    }

    fn request(authorization: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().uri("/auth/hello");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn echo_identity(request: Request<Full<Bytes>>) -> Response<BoxBody> {
        json_response(StatusCode::OK, &json!({ "id": remote_user(&request) }))
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let auth = auth();
        let token = auth.config().codec().mint(TEST_USER, None).unwrap();

        let request = auth.authenticate(request(Some(&bearer(&token)))).await.unwrap();
        assert_eq!(remote_user(&request), Some(TEST_USER));
        assert_eq!(
            request.extensions().get::<RemoteUser>(),
            Some(&RemoteUser(TEST_USER.to_string()))
        );
    }

    #[tokio::test]
    async fn test_gate_invokes_handler() {
        let auth = auth();
        let token = auth.config().codec().mint(TEST_USER, None).unwrap();

        let response = auth.gate(request(Some(&bearer(&token))), echo_identity).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({ "id": TEST_USER })
        );
    }

    #[tokio::test]
    async fn test_header_problems_are_rejected_before_verification() {
        let auth = auth();

        for header in [None, Some("Basic abc"), Some("Bearer"), Some("Bearer a b")] {
            let result = auth.authenticate(request(header)).await;
            assert_eq!(result.err(), Some(AuthError::MissingOrMalformedHeader));
        }
    }

    #[tokio::test]
    async fn test_bad_tokens_are_rejected() {
        let auth = auth();

        let garbage = auth.authenticate(request(Some("Bearer not-a-token"))).await;
        assert_eq!(garbage.err(), Some(AuthError::Malformed));

        let now = jwtgate_core::unix_now();
        let expired = auth
            .config()
            .codec()
            .mint_at(TEST_USER, None, now - 2 * 3600)
            .unwrap();
        let result = auth.authenticate(request(Some(&bearer(&expired)))).await;
        assert_eq!(result.err(), Some(AuthError::Expired));

        let other = JwtAuth::new(test_config_builder().key("other key").build().unwrap());
        let foreign = other.config().codec().mint(TEST_USER, None).unwrap();
        let result = auth.authenticate(request(Some(&bearer(&foreign)))).await;
        assert_eq!(result.err(), Some(AuthError::InvalidSignature));

        let untyped = forge_hs256(r#"{"alg":"HS256"}"#, r#"{"id":7,"exp":99999999999}"#);
        let result = auth.authenticate(request(Some(&bearer(&untyped)))).await;
        assert_eq!(result.err(), Some(AuthError::Malformed));
    }

    #[tokio::test]
    async fn test_denied_identity_never_reaches_handler() {
        let auth = JwtAuth::new(
            test_config_builder()
                .authorizator(|identity: &str, _: &Parts| identity != TEST_USER)
                .build()
                .unwrap(),
        );
        let token = auth.config().codec().mint(TEST_USER, None).unwrap();
        let flag = AtomicBool::new(false);
        let invoked = &flag;

        let response = auth
            .gate(request(Some(&bearer(&token))), move |_request| async move {
                invoked.store(true, Ordering::SeqCst);
                json_response(StatusCode::OK, &json!({}))
            })
            .await;

        assert!(!flag.load(Ordering::SeqCst));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({ "Error": "Not Authorized" })
        );
    }

    #[tokio::test]
    async fn test_authorizator_sees_the_request() {
        let auth = JwtAuth::new(
            test_config_builder()
                .authorizator(|_: &str, parts: &Parts| parts.uri.path() == "/auth/hello")
                .build()
                .unwrap(),
        );
        let token = auth.config().codec().mint(TEST_USER, None).unwrap();

        assert!(auth.authenticate(request(Some(&bearer(&token)))).await.is_ok());

        let elsewhere = Request::builder()
            .uri("/admin")
            .header(AUTHORIZATION, bearer(&token))
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(
            auth.authenticate(elsewhere).await.err(),
            Some(AuthError::AuthorizationDenied)
        );
    }

    #[tokio::test]
    async fn test_prompt_rejection() {
        let auth = JwtAuth::new(test_config_builder().prompt().build().unwrap());
        let response = auth.gate(request(None), echo_identity).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[hyper::header::WWW_AUTHENTICATE],
            "Basic realm=\"test zone\""
        );
    }

    #[test]
    fn test_refresh_handler_requires_max_refresh() {
        assert_eq!(auth().refresh_handler().err(), Some(ConfigError::RefreshDisabled));

        let refreshable = JwtAuth::new(
            test_config_builder()
                .max_refresh(Duration::from_secs(600))
                .build()
                .unwrap(),
        );
        assert!(refreshable.refresh_handler().is_ok());
    }
}
