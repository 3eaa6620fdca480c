//! AWS IAM Identity Center backed [`IdentityProvider`] and [`Portal`].

use crate::provider::{
    Account, ClientRegistration, DeviceAuthorization, IdentityProvider, Page, Portal,
    TokenExchange, DEVICE_CODE_GRANT_TYPE, SCOPES,
};

/// Device code polling interval used when the provider doesn't suggest one.
pub const DEFAULT_DEVICE_INTERVAL: i32 = 5;

/// SDK clients for one region, built once per run and passed to every step.
#[derive(Clone, Debug)]
pub struct Session {
    pub region: String,
    pub oidc: SsoOidc,
    pub portal: SsoPortal,
}

impl Session {
    pub async fn new(region: &str) -> Self {
        let config = sdk_config(region).await;
        Self {
            region: region.to_owned(),
            oidc: SsoOidc {
                inner: aws_sdk_ssooidc::Client::new(&config),
            },
            portal: SsoPortal {
                inner: aws_sdk_sso::Client::new(&config),
            },
        }
    }
}

async fn sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest())
        .await
        .to_builder()
        .region(Some(aws_config::Region::new(region.to_owned())))
        .identity_cache(aws_config::identity::IdentityCache::no_cache())
        .build()
}

#[derive(Clone, Debug)]
pub struct SsoOidc {
    inner: aws_sdk_ssooidc::Client,
}

#[derive(Clone, Debug)]
pub struct SsoPortal {
    inner: aws_sdk_sso::Client,
}

fn scopes() -> Vec<String> {
    SCOPES.iter().map(|s| (*s).to_owned()).collect()
}

fn missing(operation: &str, field: &str) -> crate::Error {
    crate::Error::Provider(format!("{operation}: AWS returned no {field}"))
}

#[async_trait::async_trait]
impl IdentityProvider for SsoOidc {
    async fn register_client(&self, client_name: &str) -> crate::Result<ClientRegistration> {
        let resp = self
            .inner
            .register_client()
            .client_name(client_name)
            .client_type("public")
            .set_scopes(Some(scopes()))
            .send()
            .await
            .map_err(|e| {
                crate::Error::Provider(format!(
                    "ssooidc:RegisterClient failed: {}",
                    aws_sdk_ssooidc::error::DisplayErrorContext(&e)
                ))
            })?;

        let expires_at = chrono::DateTime::from_timestamp(resp.client_secret_expires_at, 0)
            .ok_or_else(|| {
                crate::Error::Provider(format!(
                    "ssooidc:RegisterClient: invalid client_secret_expires_at {}",
                    resp.client_secret_expires_at
                ))
            })?;
        Ok(ClientRegistration {
            client_id: resp
                .client_id
                .ok_or_else(|| missing("ssooidc:RegisterClient", "client_id"))?,
            client_secret: resp
                .client_secret
                .ok_or_else(|| missing("ssooidc:RegisterClient", "client_secret"))?
                .into(),
            expires_at,
        })
    }

    async fn start_device_authorization(
        &self,
        client: &ClientRegistration,
        start_url: &crate::config::StartUrl,
    ) -> crate::Result<DeviceAuthorization> {
        use secrecy::ExposeSecret;

        let resp = self
            .inner
            .start_device_authorization()
            .client_id(client.client_id.clone())
            .client_secret(client.client_secret.expose_secret())
            .start_url(start_url.as_str())
            .send()
            .await
            .map_err(|e| {
                crate::Error::Provider(format!(
                    "ssooidc:StartDeviceAuthorization failed for {start_url}: {}",
                    aws_sdk_ssooidc::error::DisplayErrorContext(&e)
                ))
            })?;

        const OP: &str = "ssooidc:StartDeviceAuthorization";
        let interval = if resp.interval <= 0 {
            DEFAULT_DEVICE_INTERVAL
        } else {
            resp.interval
        };
        Ok(DeviceAuthorization {
            device_code: resp
                .device_code
                .ok_or_else(|| missing(OP, "device_code"))?
                .into(),
            user_code: resp.user_code.ok_or_else(|| missing(OP, "user_code"))?,
            verification_uri: resp
                .verification_uri
                .ok_or_else(|| missing(OP, "verification_uri"))?,
            verification_uri_complete: resp
                .verification_uri_complete
                .ok_or_else(|| missing(OP, "verification_uri_complete"))?,
            expires_at: chrono::Utc::now()
                + std::time::Duration::from_secs(resp.expires_in.max(0) as u64),
            interval: std::time::Duration::from_secs(interval as u64),
        })
    }

    async fn create_token(
        &self,
        client: &ClientRegistration,
        device: &DeviceAuthorization,
    ) -> crate::Result<TokenExchange> {
        use secrecy::ExposeSecret;

        let resp = self
            .inner
            .create_token()
            .client_id(client.client_id.clone())
            .client_secret(client.client_secret.expose_secret())
            .grant_type(DEVICE_CODE_GRANT_TYPE)
            .device_code(device.device_code.expose_secret())
            .set_scope(Some(scopes()))
            .send()
            .await;

        match resp {
            Ok(r) => Ok(TokenExchange::Issued(create_token_output_to_token(r)?)),
            Err(aws_sdk_ssooidc::error::SdkError::ServiceError(e)) => {
                let err = e.into_err();
                if err.is_authorization_pending_exception() {
                    Ok(TokenExchange::Pending)
                } else if err.is_slow_down_exception() {
                    Ok(TokenExchange::SlowDown)
                } else if err.is_access_denied_exception() {
                    Err(crate::Error::PollDenied(format!(
                        "authorization was denied: {}",
                        aws_sdk_ssooidc::error::DisplayErrorContext(&err)
                    )))
                } else if err.is_expired_token_exception() {
                    Err(crate::Error::PollDenied(format!(
                        "authorization timed out (device code expired): {}",
                        aws_sdk_ssooidc::error::DisplayErrorContext(&err)
                    )))
                } else {
                    Err(crate::Error::Provider(format!(
                        "ssooidc:CreateToken failed: {}",
                        aws_sdk_ssooidc::error::DisplayErrorContext(&err)
                    )))
                }
            }
            Err(e) => Err(crate::Error::Provider(format!(
                "ssooidc:CreateToken failed: {}",
                aws_sdk_ssooidc::error::DisplayErrorContext(&e)
            ))),
        }
    }
}

pub fn create_token_output_to_token(
    r: aws_sdk_ssooidc::operation::create_token::CreateTokenOutput,
) -> crate::Result<crate::token::TokenGrant> {
    let access_token = r
        .access_token
        .ok_or_else(|| missing("ssooidc:CreateToken", "access token"))?;
    Ok(crate::token::TokenGrant::new(
        access_token,
        r.token_type,
        Some(std::time::Duration::from_secs(r.expires_in.max(0) as u64)),
    ))
}

#[async_trait::async_trait]
impl Portal for SsoPortal {
    async fn list_accounts(
        &self,
        token: &crate::token::TokenGrant,
        next_token: Option<&str>,
    ) -> crate::Result<Page<Account>> {
        use secrecy::ExposeSecret;

        let resp = self
            .inner
            .list_accounts()
            .access_token(token.access_token.expose_secret())
            .set_next_token(next_token.map(ToOwned::to_owned))
            .send()
            .await
            .map_err(|e| {
                crate::Error::Enumeration(format!(
                    "sso:ListAccounts failed: {}",
                    aws_sdk_sso::error::DisplayErrorContext(&e)
                ))
            })?;

        let accounts = resp
            .account_list
            .unwrap_or_default()
            .into_iter()
            .map(|a| -> crate::Result<Account> {
                let account_id = a
                    .account_id
                    .ok_or_else(|| missing("sso:ListAccounts", "accountId"))?;
                Ok(Account {
                    account_name: a.account_name.unwrap_or_else(|| account_id.clone()),
                    account_id,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Page::from_next_token(accounts, resp.next_token))
    }

    async fn list_account_roles(
        &self,
        token: &crate::token::TokenGrant,
        account_id: &str,
        next_token: Option<&str>,
    ) -> crate::Result<Page<String>> {
        use secrecy::ExposeSecret;

        let resp = self
            .inner
            .list_account_roles()
            .access_token(token.access_token.expose_secret())
            .account_id(account_id)
            .set_next_token(next_token.map(ToOwned::to_owned))
            .send()
            .await
            .map_err(|e| {
                crate::Error::Enumeration(format!(
                    "sso:ListAccountRoles failed for '{account_id}': {}",
                    aws_sdk_sso::error::DisplayErrorContext(&e)
                ))
            })?;

        let roles = resp
            .role_list
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                r.role_name
                    .ok_or_else(|| missing("sso:ListAccountRoles", "roleName"))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Page::from_next_token(roles, resp.next_token))
    }
}
