//! In-memory providers for unit tests.

use crate::provider::{
    Account, ClientRegistration, DeviceAuthorization, IdentityProvider, Page, Portal,
    TokenExchange,
};

pub(crate) fn client() -> ClientRegistration {
    ClientRegistration {
        client_id: "client-id".to_owned(),
        client_secret: "client-secret".to_owned().into(),
        expires_at: chrono::Utc::now() + chrono::TimeDelta::days(90),
    }
}

pub(crate) fn device() -> DeviceAuthorization {
    DeviceAuthorization {
        device_code: "device-code".to_owned().into(),
        user_code: "ABCD-EFGH".to_owned(),
        verification_uri: "https://device.sso.us-east-2.amazonaws.com/".to_owned(),
        verification_uri_complete:
            "https://device.sso.us-east-2.amazonaws.com/?user_code=ABCD-EFGH".to_owned(),
        expires_at: chrono::Utc::now() + chrono::TimeDelta::minutes(10),
        interval: std::time::Duration::from_secs(5),
    }
}

/// Answers token exchanges from a script; once the script runs out it keeps answering pending.
#[derive(Default)]
pub(crate) struct ScriptedIdentityProvider {
    script: parking_lot::Mutex<std::collections::VecDeque<crate::Result<TokenExchange>>>,
    attempts: std::sync::atomic::AtomicUsize,
    latency: Option<std::time::Duration>,
}

impl ScriptedIdentityProvider {
    pub(crate) fn with_script(script: Vec<crate::Result<TokenExchange>>) -> Self {
        Self {
            script: parking_lot::Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub(crate) fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    async fn register_client(&self, _client_name: &str) -> crate::Result<ClientRegistration> {
        Ok(client())
    }

    async fn start_device_authorization(
        &self,
        _client: &ClientRegistration,
        _start_url: &crate::config::StartUrl,
    ) -> crate::Result<DeviceAuthorization> {
        Ok(device())
    }

    async fn create_token(
        &self,
        _client: &ClientRegistration,
        _device: &DeviceAuthorization,
    ) -> crate::Result<TokenExchange> {
        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or(Ok(TokenExchange::Pending))
    }
}

/// Serves accounts and roles in fixed pages.
///
/// `accounts` is a list of account pages; `roles` maps an account id to its role pages.
#[derive(Default)]
pub(crate) struct FakePortal {
    pub(crate) accounts: Vec<Vec<Account>>,
    pub(crate) roles: std::collections::HashMap<String, Vec<Vec<String>>>,
    pub(crate) failing_account: Option<String>,
    pub(crate) calls: parking_lot::Mutex<Vec<String>>,
}

impl FakePortal {
    pub(crate) fn account(mut self, id: &str, name: &str, role_pages: &[&[&str]]) -> Self {
        let account = Account {
            account_id: id.to_owned(),
            account_name: name.to_owned(),
        };
        match self.accounts.last_mut() {
            Some(page) => page.push(account),
            None => self.accounts.push(vec![account]),
        }
        self.roles.insert(
            id.to_owned(),
            role_pages
                .iter()
                .map(|page| page.iter().map(|r| (*r).to_owned()).collect())
                .collect(),
        );
        self
    }

    /// Following accounts go onto a new page.
    pub(crate) fn page_break(mut self) -> Self {
        self.accounts.push(vec![]);
        self
    }

    pub(crate) fn failing_on(mut self, account_id: &str) -> Self {
        self.failing_account = Some(account_id.to_owned());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

fn page_of<T: Clone>(pages: &[Vec<T>], next_token: Option<&str>) -> crate::Result<Page<T>> {
    let index: usize = match next_token {
        None => 0,
        Some(t) => t
            .parse()
            .map_err(|_| crate::Error::Enumeration(format!("bad next_token {t}")))?,
    };
    let items = pages.get(index).cloned().unwrap_or_default();
    let next = if index + 1 < pages.len() {
        Some((index + 1).to_string())
    } else {
        None
    };
    Ok(Page::from_next_token(items, next))
}

#[async_trait::async_trait]
impl Portal for FakePortal {
    async fn list_accounts(
        &self,
        _token: &crate::token::TokenGrant,
        next_token: Option<&str>,
    ) -> crate::Result<Page<Account>> {
        self.calls
            .lock()
            .push(format!("accounts:{}", next_token.unwrap_or("-")));
        page_of(&self.accounts, next_token)
    }

    async fn list_account_roles(
        &self,
        _token: &crate::token::TokenGrant,
        account_id: &str,
        next_token: Option<&str>,
    ) -> crate::Result<Page<String>> {
        self.calls.lock().push(format!(
            "roles:{account_id}:{}",
            next_token.unwrap_or("-")
        ));
        if self.failing_account.as_deref() == Some(account_id) {
            return Err(crate::Error::Enumeration(format!(
                "sso:ListAccountRoles failed for {account_id}: TooManyRequestsException"
            )));
        }
        let pages = self.roles.get(account_id).cloned().unwrap_or_default();
        page_of(&pages, next_token)
    }
}
