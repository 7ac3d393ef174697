use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub phone: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthRequired("Invalid session token".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    /// 根据签发时刻的账户状态生成会话令牌
    pub fn generate_session_token(&self, user: &users::Model) -> AppResult<String> {
        let claims = self.claims_for(user, Utc::now());
        self.encode_claims(&claims)
    }

    pub fn verify_session_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期即失效，不留宽限
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::AuthRequired("Invalid session token".to_string()),
            })
    }

    fn claims_for(&self, user: &users::Model, now: DateTime<Utc>) -> Claims {
        Claims {
            sub: user.id.to_string(),
            phone: user.phone.clone(),
            role: user.role.clone(),
            exp: (now + Duration::seconds(self.expires_in)).timestamp(),
            iat: now.timestamp(),
        }
    }

    fn encode_claims(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(AppError::JwtError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: 42,
            phone: "+2348031234567".to_string(),
            full_name: "LetsGo User".to_string(),
            role: UserRole::Driver,
            phone_verified: true,
            wallet_id: Some(7),
            rating: 5.0,
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_carries_identity_claims() {
        let service = JwtService::new("test-secret", 7 * 24 * 3600);
        let token = service.generate_session_token(&sample_user()).unwrap();
        let claims = service.verify_session_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.phone, "+2348031234567");
        assert_eq!(claims.role, UserRole::Driver);
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = JwtService::new("test-secret", 7 * 24 * 3600);
        let issued = Utc::now() - Duration::days(8);
        let claims = service.claims_for(&sample_user(), issued);
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(
            service.verify_session_token(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_key_is_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);
        let token = issuer.generate_session_token(&sample_user()).unwrap();

        assert!(matches!(
            verifier.verify_session_token(&token),
            Err(AppError::AuthRequired(_))
        ));
        assert!(matches!(
            verifier.verify_session_token("not-a-jwt"),
            Err(AppError::AuthRequired(_))
        ));
    }

    #[test]
    fn test_token_is_rejected_right_after_expiry() {
        let service = JwtService::new("test-secret", 3600);
        let issued = Utc::now() - Duration::seconds(3605);
        let claims = service.claims_for(&sample_user(), issued);
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(
            service.verify_session_token(&token),
            Err(AppError::TokenExpired)
        ));
    }
}
