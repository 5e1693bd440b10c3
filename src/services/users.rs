//! Registration, profile and token exchange.

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use super::auth::{hash_password, verify_password, TokenKind, TokenPair, TokenService};
use crate::config::AdminConfig;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::{Credentials, NewUser, ProfileUpdate, RegisterInput, User, UserChanges};
use crate::policy::{self, Resource};
use crate::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn bad_credentials() -> Error {
    Error::Unauthorized("no active account found with the given credentials".to_string())
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self { store, tokens, bcrypt_cost }
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<User> {
        input.validate()?;
        let user = self
            .store
            .create_user(&NewUser {
                email: normalize_email(&input.email),
                password_hash: hash_password(&input.password, self.bcrypt_cost).await?,
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                is_staff: false,
            })
            .await?;
        info!("User {} registered", user.id);
        Ok(user)
    }

    /// Creates the configured staff account unless the email is already in use.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> Result<User> {
        let email = normalize_email(&admin.email);
        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            if !existing.is_staff {
                warn!("Admin email {} belongs to a non-staff account", email);
            }
            return Ok(existing);
        }

        let user = self
            .store
            .create_user(&NewUser {
                email,
                password_hash: hash_password(&admin.password, self.bcrypt_cost).await?,
                first_name: String::new(),
                last_name: String::new(),
                is_staff: true,
            })
            .await?;
        info!("Staff account {} created", user.id);
        Ok(user)
    }

    pub async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenPair> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(&credentials.email))
            .await?
            .ok_or_else(bad_credentials)?;

        if !verify_password(&credentials.password, &user.password_hash).await? {
            return Err(bad_credentials());
        }
        self.tokens.issue_pair(&user)
    }

    /// New access token for a valid refresh token. The staff flag is read
    /// again from the account, not copied from the old token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let ctx = self.tokens.verify(refresh_token, Some(TokenKind::Refresh))?.context()?;
        let user = self.store.get_user(ctx.user_id).await?.ok_or_else(Error::unauthorized)?;
        self.tokens.issue(&user, TokenKind::Access)
    }

    pub fn verify(&self, token: &str) -> Result<()> {
        self.tokens.verify(token, None).map(|_| ())
    }

    pub async fn me(&self, ctx: &RequestContext) -> Result<User> {
        self.store
            .get_user(ctx.user_id)
            .await?
            .ok_or_else(|| Error::not_found("user", ctx.user_id))
    }

    pub async fn update_me(&self, ctx: &RequestContext, update: &ProfileUpdate) -> Result<User> {
        policy::ensure_can_modify(Some(ctx), Resource::Profile { user_id: ctx.user_id })?;
        update.validate()?;

        let password_hash = match update.password.as_deref() {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };
        let changes = UserChanges {
            password_hash,
            first_name: update.first_name.clone(),
            last_name: update.last_name.clone(),
        };
        self.store.update_user(ctx.user_id, &changes).await
    }
}
