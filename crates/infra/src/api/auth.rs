//! Sign-in against the REST API
//!
//! Password sign-in is a one-shot primitive. Hash sign-in produces the
//! session token every other call rides on and is cached for the session TTL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetlink_common::Clock;
use fleetlink_domain::constants::{PATH_AUTH_HASH_SIGNIN, PATH_PASSWORD_SIGNIN};
use fleetlink_domain::{codes, scopes, ApiError, AuthResponse, Credentials, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::classifier::{classify_final, require_field};
use super::dispatcher::{Dispatcher, Request};

/// Trait for providing session tokens
///
/// Lets collaborators obtain a token without knowing how it was acquired.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A valid session token, signing in if needed.
    async fn access_token(&self) -> Result<String>;
}

#[derive(Serialize)]
struct PasswordSigninBody<'a> {
    password: &'a str,
    username: &'a str,
}

#[derive(Serialize)]
struct HashSigninBody<'a> {
    authhash: &'a str,
    username: &'a str,
}

/// Password and hash authenticators sharing the dispatcher's session cache.
pub struct Authenticator {
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(dispatcher: Arc<Dispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self { dispatcher, clock }
    }

    /// Exchange a password for an auth hash. Never touches the cache.
    #[instrument(skip(self, password))]
    pub async fn password_signin(&self, username: &str, password: &str) -> Result<Credentials> {
        let request = Request::post(PATH_PASSWORD_SIGNIN).json(
            &PasswordSigninBody { password, username },
            codes::AUTH_CANT_PREP_PASSWORD_SIGNIN,
        )?;
        let body = self.dispatcher.execute(request).await?.body;

        let response: AuthResponse = classify_final(&body, &scopes::PASSWORD_SIGNIN)?;
        require_field(&response.auth_hash, codes::AUTH_NO_AUTH_HASH)?;

        debug!("password sign-in accepted");
        Ok(Credentials::new(
            response.auth_hash,
            username,
            response.user_id,
            response.token,
            self.now(),
        ))
    }

    /// Session for `username`, from the cache when still valid.
    ///
    /// Concurrent callers collapse into a single sign-in. Each caller waits
    /// at most the dispatch timeout for a refresh started by someone else.
    /// The caller running the sign-in reports the dispatcher's own errors.
    #[instrument(skip(self, auth_hash))]
    pub async fn hash_signin(&self, username: &str, auth_hash: &str) -> Result<Credentials> {
        let session = self.dispatcher.session();

        // The cache holds one identity; a different user always signs in.
        if let Some(cached) = session.last_known() {
            if cached.user() != username {
                return self.hash_signin_no_cache(username, auth_hash).await;
            }
        }

        let credentials = session
            .get_or_refresh_within(
                self.dispatcher.config().timeout(),
                || ApiError::new(codes::AUTH_SESSION_WAIT_TIMEOUT),
                || self.fetch_session(username, auth_hash),
            )
            .await?;

        // Another task may have cached a different user while we waited.
        if credentials.user() != username {
            return self.hash_signin_no_cache(username, auth_hash).await;
        }
        Ok(credentials)
    }

    /// Always sign in and overwrite the cached session.
    #[instrument(skip(self, auth_hash))]
    pub async fn hash_signin_no_cache(&self, username: &str, auth_hash: &str) -> Result<Credentials> {
        let credentials = self.fetch_session(username, auth_hash).await?;
        self.dispatcher.session().set(credentials.clone());
        info!(user_id = credentials.user_id(), "session cached");
        Ok(credentials)
    }

    /// Force the next hash sign-in to hit the network.
    pub fn expire_session(&self) {
        self.dispatcher.session().invalidate();
        info!("session invalidated");
    }

    /// The cached session, if still valid.
    pub fn current_session(&self) -> Option<Credentials> {
        self.dispatcher.session().get()
    }

    async fn fetch_session(&self, username: &str, auth_hash: &str) -> Result<Credentials> {
        let request = Request::post(PATH_AUTH_HASH_SIGNIN).json(
            &HashSigninBody { authhash: auth_hash, username },
            codes::AUTH_HASH_CANT_PREP_REQUEST,
        )?;
        let body = self.dispatcher.execute(request).await?.body;

        let response: AuthResponse = classify_final(&body, &scopes::AUTH_HASH_SIGNIN)?;
        require_field(&response.token, codes::AUTH_NO_TOKEN)?;

        let auth_hash =
            if response.auth_hash.is_empty() { auth_hash.to_string() } else { response.auth_hash };
        Ok(Credentials::new(auth_hash, username, response.user_id, response.token, self.now()))
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }
}

/// Token provider that signs in with a stored auth hash.
pub struct HashTokenProvider {
    authenticator: Arc<Authenticator>,
    username: String,
    auth_hash: String,
}

impl HashTokenProvider {
    pub fn new(
        authenticator: Arc<Authenticator>,
        username: impl Into<String>,
        auth_hash: impl Into<String>,
    ) -> Self {
        Self { authenticator, username: username.into(), auth_hash: auth_hash.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for HashTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let credentials = self.authenticator.hash_signin(&self.username, &self.auth_hash).await?;
        Ok(credentials.token().to_string())
    }
}
