//! Accounts and bearer tokens.
//!
//! Passwords are hashed with bcrypt. Tokens are HS256 JWTs carrying the user id,
//! username and role, signed with the configured secret and checked against the
//! configured issuer.

use crate::{
    config::{
        settings::AuthConfig,
        users::{ROLE_USER, SeedUser},
    },
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use sea_orm::{Condition, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user id in `sub`.
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| Error::unauthorized("Token subject is not a user id"))
    }
}

/// Issues and checks access tokens.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: AuthConfig,
}

impl JwtManager {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.validate_exp = true;
        validation.leeway = 30;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            config: config.clone(),
        }
    }

    /// Signs a token for `user` valid for the configured lifetime.
    pub fn issue(&self, user: &user::Model) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.jwt_expiration_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Checks signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::unauthorized("Token has expired"),
                _ => Error::unauthorized(format!("Invalid token: {e}")),
            })
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Input for [`register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl AuthResponse {
    fn new(access_token: String, user: &user::Model) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn insert_user(
    db: &DatabaseConnection,
    registration: Registration,
    role: &str,
    cost: u32,
) -> Result<user::Model> {
    let password_hash = bcrypt::hash(&registration.password, cost)?;
    user::ActiveModel {
        username: Set(registration.username),
        email: Set(registration.email),
        password_hash: Set(password_hash),
        first_name: Set(registration.first_name),
        last_name: Set(registration.last_name),
        role: Set(role.to_string()),
        active: Set(true),
        created_at: Set(Utc::now()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a `USER` account and signs a token for it.
#[instrument(skip(db, jwt, registration), fields(username = %registration.username))]
pub async fn register(
    db: &DatabaseConnection,
    jwt: &JwtManager,
    registration: Registration,
) -> Result<AuthResponse> {
    if registration.username.trim().is_empty()
        || registration.email.trim().is_empty()
        || registration.password.is_empty()
    {
        return Err(Error::validation("Username, email and password are required"));
    }

    let clash = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(registration.username.as_str()))
                .add(user::Column::Email.eq(registration.email.as_str())),
        )
        .all(db)
        .await?;
    if clash.iter().any(|u| u.username == registration.username) {
        return Err(Error::Conflict {
            message: "Username is already taken".to_string(),
        });
    }
    if !clash.is_empty() {
        return Err(Error::Conflict {
            message: "Email is already in use".to_string(),
        });
    }

    let created = insert_user(db, registration, ROLE_USER, jwt.config().password_cost).await?;
    info!(id = created.id, "Registered user");
    Ok(AuthResponse::new(jwt.issue(&created)?, &created))
}

/// Checks credentials, records the login time and signs a token.
#[instrument(skip(db, jwt, password))]
pub async fn login(
    db: &DatabaseConnection,
    jwt: &JwtManager,
    username: &str,
    password: &str,
) -> Result<AuthResponse> {
    let Some(found) = find_by_username(db, username).await? else {
        warn!("Login for unknown user");
        return Err(Error::unauthorized(INVALID_CREDENTIALS));
    };
    if !bcrypt::verify(password, &found.password_hash)? {
        warn!("Login with wrong password");
        return Err(Error::unauthorized(INVALID_CREDENTIALS));
    }
    if !found.active {
        return Err(Error::unauthorized("Account is disabled"));
    }

    let mut active: user::ActiveModel = found.into();
    active.last_login = Set(Some(Utc::now()));
    let logged_in = active.update(db).await?;

    info!(id = logged_in.id, "User logged in");
    Ok(AuthResponse::new(jwt.issue(&logged_in)?, &logged_in))
}

/// Resolves a token to an active user.
pub async fn authenticate(
    db: &DatabaseConnection,
    jwt: &JwtManager,
    token: &str,
) -> Result<user::Model> {
    let claims = jwt.verify(token)?;
    let user_id = claims.user_id()?;
    debug!(user_id, "Token verified");

    User::find_by_id(user_id)
        .one(db)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| Error::unauthorized("User for this token no longer exists"))
}

/// Creates the configured accounts that do not exist yet; returns how many were created.
#[instrument(skip_all)]
pub async fn seed_users(db: &DatabaseConnection, users: &[SeedUser], cost: u32) -> Result<usize> {
    let mut created = 0;
    for seed in users {
        if find_by_username(db, &seed.username).await?.is_some() {
            debug!(username = %seed.username, "Seed user already exists");
            continue;
        }
        let registration = Registration {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            first_name: None,
            last_name: None,
        };
        insert_user(db, registration, &seed.role, cost).await?;
        info!(username = %seed.username, role = %seed.role, "Created seed user");
        created += 1;
    }
    Ok(created)
}
