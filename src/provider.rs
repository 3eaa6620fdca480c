//! Seams between the login flow and the remote identity provider.
//!
//! [`IdentityProvider`] covers the OIDC side (client registration, device authorization and
//! token exchange), [`Portal`] covers the account and role listings reachable with an access
//! token. Production implementations live in [`crate::ext_awssso`].

pub const SCOPES: [&str; 2] = ["openid", "sso-portal:*"];
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Public OAuth client registered for the duration of a single run.
#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: secrecy::SecretString,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl ClientRegistration {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= chrono::Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct DeviceAuthorization {
    pub device_code: secrecy::SecretString,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub interval: std::time::Duration,
}

impl DeviceAuthorization {
    /// URL to hand to the operator; falls back to the bare verification URI when the provider
    /// didn't send one with the user code embedded.
    pub fn login_url(&self) -> &str {
        if self.verification_uri_complete.is_empty() {
            &self.verification_uri
        } else {
            &self.verification_uri_complete
        }
    }
}

/// Result of a single token exchange attempt that did not end the flow with an error.
#[derive(Debug)]
pub enum TokenExchange {
    /// The operator hasn't finished logging in yet.
    Pending,
    /// Same as pending, and the provider asked to poll less often.
    SlowDown,
    Issued(crate::token::TokenGrant),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,
    pub account_name: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
    pub is_last_page: bool,
}

impl<T> Page<T> {
    /// A page whose boundary flag derives from the presence of a continuation token.
    pub fn from_next_token(items: Vec<T>, next_token: Option<String>) -> Self {
        let next_token = next_token.filter(|t| !t.is_empty());
        Self {
            items,
            is_last_page: next_token.is_none(),
            next_token,
        }
    }
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register_client(&self, client_name: &str) -> crate::Result<ClientRegistration>;

    async fn start_device_authorization(
        &self,
        client: &ClientRegistration,
        start_url: &crate::config::StartUrl,
    ) -> crate::Result<DeviceAuthorization>;

    /// Classifies the response: pending and slow-down are not errors. Explicit denial or an
    /// expired device code must be reported as [`crate::Error::PollDenied`].
    async fn create_token(
        &self,
        client: &ClientRegistration,
        device: &DeviceAuthorization,
    ) -> crate::Result<TokenExchange>;
}

#[async_trait::async_trait]
pub trait Portal: Send + Sync {
    async fn list_accounts(
        &self,
        token: &crate::token::TokenGrant,
        next_token: Option<&str>,
    ) -> crate::Result<Page<Account>>;

    async fn list_account_roles(
        &self,
        token: &crate::token::TokenGrant,
        account_id: &str,
        next_token: Option<&str>,
    ) -> crate::Result<Page<String>>;
}
