//! Bearer tokens minted by `POST /auth/verify` (spec §6). The spec treats
//! `JWT_SECRET` as an opaque signing key without mandating a JWT library —
//! matching the teacher's preference for its own `hmac` module over pulling
//! in a new dependency for a service-internal concern. The token is
//! `address.issued_at_ms.signature`, where `signature` is an HMAC-SHA256
//! over `address|issued_at_ms`.

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use chrono::Utc;
use std::future::{ready, Ready};
use std::str::FromStr;
use voicepay_auth::hmac::{compute_hmac, verify_hmac};
use voicepay_types::{UserAddress, VoicePayError};

pub fn mint_token(secret: &[u8], address: &UserAddress, issued_at_ms: i64) -> String {
    let payload = format!("{}|{}", address.as_str(), issued_at_ms);
    let signature = compute_hmac(secret, payload.as_bytes());
    format!("{}.{}.{}", address.as_str(), issued_at_ms, signature)
}

pub fn verify_token(
    secret: &[u8],
    token: &str,
    now_ms: i64,
    ttl_seconds: i64,
) -> Result<UserAddress, VoicePayError> {
    let mut parts = token.splitn(3, '.');
    let (Some(address_str), Some(issued_at_str), Some(signature)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(VoicePayError::Unauthorized);
    };

    let issued_at_ms: i64 = issued_at_str.parse().map_err(|_| VoicePayError::Unauthorized)?;
    let payload = format!("{address_str}|{issued_at_str}");
    if !verify_hmac(secret, payload.as_bytes(), signature) {
        return Err(VoicePayError::Unauthorized);
    }

    if now_ms - issued_at_ms > ttl_seconds * 1000 {
        return Err(VoicePayError::Unauthorized);
    }

    UserAddress::from_str(address_str).map_err(|_| VoicePayError::Unauthorized)
}

/// Extractor pulling the caller's [`UserAddress`] out of a valid
/// `Authorization: Bearer <token>` header, using the state's `jwt_secret`
/// and `bearer_token_ttl_seconds`.
pub struct AuthenticatedUser(pub UserAddress);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match req.app_data::<actix_web::web::Data<crate::state::AppState>>() {
            Some(state) => state,
            None => {
                return ready(Err(crate::error::ApiError(VoicePayError::Internal(
                    "app state missing".to_string(),
                ))
                .into()))
            }
        };

        let token = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let token = match token {
            Some(t) => t,
            None => return ready(Err(crate::error::ApiError(VoicePayError::Unauthorized).into())),
        };

        let now_ms = Utc::now().timestamp_millis();
        match verify_token(
            &state.config.jwt_secret,
            token,
            now_ms,
            state.config.bearer_token_ttl_seconds,
        ) {
            Ok(address) => ready(Ok(AuthenticatedUser(address))),
            Err(e) => ready(Err(crate::error::ApiError(e).into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_verifies_for_the_same_address() {
        let secret = b"test-jwt-secret";
        let address: UserAddress = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let issued_at = 1_700_000_000_000;
        let token = mint_token(secret, &address, issued_at);

        let verified = verify_token(secret, &token, issued_at + 1_000, 86_400).unwrap();
        assert_eq!(verified, address);
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = b"test-jwt-secret";
        let address: UserAddress = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let issued_at = 1_700_000_000_000;
        let token = mint_token(secret, &address, issued_at);

        let far_future = issued_at + 100_000_000;
        assert!(verify_token(secret, &token, far_future, 86_400).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let secret = b"test-jwt-secret";
        let address: UserAddress = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let token = mint_token(secret, &address, 1_700_000_000_000);
        let tampered = token.replace("1111", "2222");
        assert!(verify_token(secret, &tampered, 1_700_000_000_000, 86_400).is_err());
    }
}
