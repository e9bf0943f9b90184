//! Response builders

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, WWW_AUTHENTICATE};
use hyper::{Response, StatusCode};
use jwtgate_core::{JwtConfig, UnauthorizedStyle, NOT_AUTHORIZED};
use serde_json::json;

pub type BoxBody = Full<Bytes>;

/// JSON response with `status`
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<BoxBody> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// `200 {"token": ...}`
pub fn token_response(token: &str) -> Response<BoxBody> {
    json_response(StatusCode::OK, &json!({ "token": token }))
}

/// The single response every rejected request gets, whatever the reason.
pub fn unauthorized(config: &JwtConfig) -> Response<BoxBody> {
    let body = json!({ "Error": NOT_AUTHORIZED });

    match config.unauthorized_style() {
        UnauthorizedStyle::Prompt => {
            let mut response = json_response(StatusCode::UNAUTHORIZED, &body);
            // realm was checked to be a valid header value at startup
            if let Ok(challenge) =
                HeaderValue::from_str(&format!("Basic realm=\"{}\"", config.realm()))
            {
                response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
            }
            response
        }
        UnauthorizedStyle::Silent { status } => json_response(status, &body),
    }
}
