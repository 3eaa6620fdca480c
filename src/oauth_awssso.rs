use crate::provider::{ClientRegistration, DeviceAuthorization, IdentityProvider};

/// Registers a public OIDC client. A failed registration aborts the run; nothing is retried.
#[tracing::instrument(skip(provider))]
pub async fn register_client<P>(provider: &P, client_name: &str) -> crate::Result<ClientRegistration>
where
    P: IdentityProvider + ?Sized,
{
    if client_name.trim().is_empty() {
        return Err(crate::Error::Config(
            "client name must not be empty".to_owned(),
        ));
    }
    let client = provider.register_client(client_name).await?;
    tracing::info!(client_id = %client.client_id, expires_at = %client.expires_at, "Registered OIDC client");
    Ok(client)
}

/// Starts the device authorization grant for `start_url`. A start URL that isn't an http(s) URL
/// with a host is a [`crate::Error::Provider`] failure, like any other rejected initiation.
///
/// The caller must surface [`DeviceAuthorization::login_url`] to the operator before polling,
/// otherwise nobody can complete the login the poller waits for.
#[tracing::instrument(skip(provider, client, start_url), fields(client_id = %client.client_id, start_url = %start_url))]
pub async fn start_device_authorization<P>(
    provider: &P,
    client: &ClientRegistration,
    start_url: &crate::config::StartUrl,
) -> crate::Result<DeviceAuthorization>
where
    P: IdentityProvider + ?Sized,
{
    crate::config::validate_start_url(start_url).map_err(|e| match e {
        crate::Error::Config(m) => crate::Error::Provider(m),
        e => e,
    })?;
    if client.is_expired() {
        return Err(crate::Error::Provider(format!(
            "client registration {} expired at {}",
            client.client_id, client.expires_at
        )));
    }
    let device = provider.start_device_authorization(client, start_url).await?;
    tracing::info!(
        user_code = %device.user_code,
        expires_at = %device.expires_at,
        interval = ?device.interval,
        "Initiated AWS SSO Device Grant flow"
    );
    Ok(device)
}
