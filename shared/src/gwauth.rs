//! Gateway identity propagation.
//!
//! The HTTP gateway validates inbound tokens itself and forwards two
//! headers: `from-gateway: true` and `jwt-payload` (base64-encoded token
//! claims). Services never see the raw token. When `from-gateway` is
//! present the claims are mandatory, and the caller's own id must be
//! substituted wherever an operation would accept an arbitrary subject id.

use axum::http::HeaderMap;
use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ServiceError};

pub const FROM_GATEWAY_HEADER: &str = "from-gateway";
pub const JWT_PAYLOAD_HEADER: &str = "jwt-payload";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Returns the gateway caller's claims, `None` for direct (service-to-
/// service) requests, or `Unauthorised` when a gateway request carries no
/// usable claims.
pub fn gateway_claims(headers: &HeaderMap) -> Result<Option<JwtClaims>, ServiceError> {
    if !headers.contains_key(FROM_GATEWAY_HEADER) {
        return Ok(None);
    }

    let payload = headers
        .get(JWT_PAYLOAD_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::new(ErrorCode::Unauthorised, "invalid jwt"))?;

    let bytes = BASE64_STANDARD
        .decode(payload)
        .map_err(|err| ServiceError::wrap(ErrorCode::Unauthorised, "malformed jwt", err))?;

    let claims: JwtClaims = serde_json::from_slice(&bytes)
        .map_err(|err| ServiceError::wrap(ErrorCode::Unauthorised, "malformed jwt", err))?;

    Ok(Some(claims))
}

/// Encodes claims the way the gateway does. Used by the auth service when
/// issuing its opaque token material.
pub fn encode_claims(claims: &JwtClaims) -> Result<String, ServiceError> {
    let bytes = serde_json::to_vec(claims)?;
    Ok(BASE64_STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn gateway_headers(payload: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FROM_GATEWAY_HEADER, HeaderValue::from_static("true"));
        headers.insert(JWT_PAYLOAD_HEADER, HeaderValue::from_str(payload).unwrap());
        headers
    }

    #[test]
    fn direct_request_has_no_claims() {
        let headers = HeaderMap::new();
        assert!(gateway_claims(&headers).unwrap().is_none());
    }

    #[test]
    fn gateway_request_without_payload_is_unauthorised() {
        let mut headers = HeaderMap::new();
        headers.insert(FROM_GATEWAY_HEADER, HeaderValue::from_static("true"));

        let err = gateway_claims(&headers).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorised);
    }

    #[test]
    fn claims_round_trip() {
        let claims = JwtClaims {
            sub: "7f2c1a9e-0000-4000-8000-000000000001".into(),
            iat: 1700000000,
            exp: 1700003600,
        };
        let encoded = encode_claims(&claims).unwrap();

        let headers = gateway_headers(&encoded);
        let decoded = gateway_claims(&headers).unwrap().unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn garbage_payload_is_unauthorised() {
        let headers = gateway_headers("%%%not-base64%%%");
        let err = gateway_claims(&headers).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorised);
    }
}
