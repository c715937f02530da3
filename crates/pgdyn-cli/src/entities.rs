//! Built-in entities whose tables `pgdyn schema` creates.

use chrono::{DateTime, Utc};
use pgdyn::{Entity, SchemaRegistry};

#[derive(Debug, Clone, Entity)]
pub struct User {
    #[pgdyn(column = "id", primary_key)]
    pub id: String,
    #[pgdyn(column = "name")]
    pub name: String,
    #[pgdyn(column = "email")]
    pub email: String,
    #[pgdyn(column = "emailVerified")]
    pub email_verified: bool,
    #[pgdyn(column = "image")]
    pub image: String,
    #[pgdyn(column = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[pgdyn(column = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Entity)]
pub struct Session {
    #[pgdyn(column = "id", primary_key)]
    pub id: String,
    #[pgdyn(column = "userId")]
    pub user_id: String,
    #[pgdyn(column = "token")]
    pub token: String,
    #[pgdyn(column = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[pgdyn(column = "ipAddress")]
    pub ip_address: String,
    #[pgdyn(column = "userAgent")]
    pub user_agent: String,
    #[pgdyn(column = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[pgdyn(column = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Entity)]
pub struct Account {
    #[pgdyn(column = "id", primary_key)]
    pub id: String,
    #[pgdyn(column = "userId")]
    pub user_id: String,
    #[pgdyn(column = "accountId")]
    pub account_id: String,
    #[pgdyn(column = "providerId")]
    pub provider_id: String,
    #[pgdyn(column = "accessToken")]
    pub access_token: String,
    #[pgdyn(column = "refreshToken")]
    pub refresh_token: String,
    #[pgdyn(column = "accessTokenExpiresAt")]
    pub access_token_expires_at: DateTime<Utc>,
    #[pgdyn(column = "refreshTokenExpiresAt")]
    pub refresh_token_expires_at: DateTime<Utc>,
    #[pgdyn(column = "scope")]
    pub scope: String,
    #[pgdyn(column = "idToken")]
    pub id_token: String,
    #[pgdyn(column = "password")]
    pub password: String,
    #[pgdyn(column = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[pgdyn(column = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Entity)]
pub struct Verification {
    #[pgdyn(column = "id", primary_key)]
    pub id: String,
    #[pgdyn(column = "identifier")]
    pub identifier: String,
    #[pgdyn(column = "value")]
    pub value: String,
    #[pgdyn(column = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[pgdyn(column = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[pgdyn(column = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The built-in entities, in creation order.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with::<User>()
        .with::<Session>()
        .with::<Account>()
        .with::<Verification>()
}
