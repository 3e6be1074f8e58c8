use crate::schema::Claims;
use chrono::{Duration, Utc};
use genius_error::AuthError;
use genius_settings::config::AuthSettings;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use password_auth::{generate_hash, verify_password};

#[derive(Clone)]
pub struct AuthManager {
    jwt_secret: String,
    expiry_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            expiry_hours: settings.jwt_expiry_hours,
            issuer: settings.jwt_issuer.clone(),
        }
    }

    /// Issue an HS256 token for a user
    ///
    /// # Arguments
    ///
    /// * `user_id` - The id of the user
    /// * `username` - The username of the user
    ///
    /// # Returns
    ///
    /// * `String` - The encoded token
    pub fn generate_jwt(&self, user_id: &str, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::EncodeError(format!("{}", e)))
    }

    /// Decode a token, checking signature, expiry and issuer
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(format!("{}", e)))
    }

    pub fn hash_password(&self, password: &str) -> String {
        generate_hash(password)
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<(), AuthError> {
        verify_password(password, password_hash).map_err(|_| AuthError::InvalidCredentials)
    }
}
