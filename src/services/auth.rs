use std::sync::RwLock;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::watch;

/// Identity of the signed-in user as carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CurrentUser {
    pub(crate) subject: String,
    pub(crate) display_name: Option<String>,
}

impl CurrentUser {
    pub(crate) fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.subject)
    }
}

/// Session surface consumed by the history page.
pub(crate) trait AuthSession: Send + Sync {
    fn token(&self) -> Option<String>;
    fn current_user(&self) -> Option<CurrentUser>;
    fn logout(&self);
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// In-memory bearer token session.
///
/// The signature is not checked here; the backend remains the authority and
/// answers 401 for anything it does not accept.
pub(crate) struct TokenSession {
    token: RwLock<Option<String>>,
    logged_out: watch::Sender<bool>,
}

impl TokenSession {
    pub(crate) fn new(token: Option<String>) -> Self {
        let (logged_out, _) = watch::channel(false);
        Self { token: RwLock::new(token), logged_out }
    }

    /// Flips to `true` once the session has ended.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_out.subscribe()
    }
}

impl AuthSession for TokenSession {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn current_user(&self) -> Option<CurrentUser> {
        let token = self.token()?;
        match decode_user(&token) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::debug!(error = %err, "Session token carries no readable identity");
                None
            }
        }
    }

    fn logout(&self) {
        let previous = match self.token.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if previous.is_some() {
            tracing::info!("Session ended");
        }
        self.logged_out.send_replace(true);
    }
}

fn decode_user(token: &str) -> Result<CurrentUser, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    let claims = data.claims;
    Ok(CurrentUser { subject: claims.sub, display_name: claims.name.or(claims.email) })
}
