#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Start URL of your AWS SSO instance; e.g. https://{something}.awsapps.com/start
    pub start_url: crate::config::StartUrl,

    /// AWS region to use for SSO and the generated configuration.
    #[arg(long, env = "REGION", default_value = crate::config::DEFAULT_REGION)]
    pub region: String,

    /// Client name to use when registering with SSO OIDC.
    #[arg(long, env = "CLIENT_NAME", default_value = crate::config::DEFAULT_CLIENT_NAME)]
    pub client_name: String,

    /// Token polling interval (e.g. 5s, 1m30s).
    #[arg(long, env = "POLL_INTERVAL", default_value = "5s", value_parser = crate::config::parse_duration)]
    pub poll_interval: std::time::Duration,

    /// Give up waiting for the login after this long.
    #[arg(long, env = "POLL_TIMEOUT", default_value = "5m", value_parser = crate::config::parse_duration)]
    pub poll_timeout: std::time::Duration,

    #[arg(long, env = "SSOGEN_FORMAT", default_value = "config")]
    pub format: crate::config::OutputFormat,
}

impl GenerateArgs {
    pub fn to_run_config(&self) -> crate::Result<crate::config::RunConfig> {
        crate::config::RunConfig::new(
            self.region.clone(),
            self.client_name.clone(),
            self.poll_interval,
            self.poll_timeout,
            self.start_url.clone(),
            self.format,
        )
    }
}

#[tokio::main]
pub async fn run(args: &GenerateArgs) -> Result<(), anyhow::Error> {
    use tokio::io::AsyncWriteExt;

    let config = args.to_run_config()?;
    let session = crate::ext_awssso::Session::new(&config.region).await;
    tracing::debug!(session = ?session, config = ?config, "Starting");

    let mut stderr = tokio::io::stderr();
    let document = generate(
        &config,
        std::sync::Arc::new(session.oidc),
        &session.portal,
        &mut stderr,
        interrupted(),
    )
    .await
    .inspect_err(|e| {
        if e.is_poll_failure() {
            tracing::warn!(err = %e, "Login did not complete");
        }
    })?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(document.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Runs the whole flow and returns the rendered document. Nothing is returned unless every step
/// succeeded.
///
/// The only thing written to `prompt` is the line carrying the verification URL, before polling
/// starts.
pub async fn generate<I, P, W, C>(
    config: &crate::config::RunConfig,
    provider: std::sync::Arc<I>,
    portal: &P,
    prompt: &mut W,
    cancel: C,
) -> crate::Result<String>
where
    I: crate::provider::IdentityProvider + ?Sized + 'static,
    P: crate::provider::Portal + ?Sized,
    W: tokio::io::AsyncWrite + Unpin,
    C: std::future::Future<Output = ()> + Send + 'static,
{
    use tokio::io::AsyncWriteExt;

    config.validate()?;

    let client = crate::oauth_awssso::register_client(&*provider, &config.client_name).await?;
    let device =
        crate::oauth_awssso::start_device_authorization(&*provider, &client, &config.start_url)
            .await?;

    if config.poll_interval < device.interval {
        tracing::debug!(
            poll_interval = ?config.poll_interval,
            suggested = ?device.interval,
            "Polling faster than the provider suggests; expect slow_down responses"
        );
    }

    prompt
        .write_all(format!("Login at {}\n", device.login_url()).as_bytes())
        .await?;
    prompt.flush().await?;

    let token = crate::poller::poll_with_cancel(
        provider,
        client,
        device,
        config.poll_interval,
        config.poll_timeout,
        cancel,
    )
    .await?;
    tracing::info!("Logged in");

    let profiles = crate::enumerator::enumerate(portal, &token).await?;

    match config.format {
        crate::config::OutputFormat::Config => Ok(crate::render::render(
            &profiles,
            &config.region,
            &config.start_url,
        )),
        crate::config::OutputFormat::Json => crate::render::render_json(&profiles),
    }
}

/// Resolves on Ctrl-C. Never resolves if the signal handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(err = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TokenExchange;
    use crate::testing::{FakePortal, ScriptedIdentityProvider};
    use std::sync::Arc;
    use std::time::Duration;

    fn config(format: crate::config::OutputFormat) -> crate::config::RunConfig {
        crate::config::RunConfig::new(
            "us-east-2".to_owned(),
            "sso-configurator".to_owned(),
            Duration::from_secs(5),
            Duration::from_secs(60),
            "https://x.awsapps.com/start".parse().unwrap(),
            format,
        )
        .unwrap()
    }

    fn issuing_provider() -> Arc<ScriptedIdentityProvider> {
        Arc::new(ScriptedIdentityProvider::with_script(vec![
            Ok(TokenExchange::Pending),
            Ok(TokenExchange::Issued(crate::token::TokenGrant::new(
                "access", None, None,
            ))),
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end() {
        let portal = FakePortal::default()
            .account("111", "Acct", &[&["Admin"]])
            .account("222", "Other Acct", &[&["ReadOnly"]]);
        let mut prompt: Vec<u8> = vec![];

        let document = generate(
            &config(crate::config::OutputFormat::Config),
            issuing_provider(),
            &portal,
            &mut prompt,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(prompt).unwrap(),
            "Login at https://device.sso.us-east-2.amazonaws.com/?user_code=ABCD-EFGH\n"
        );
        assert_eq!(
            document,
            indoc::indoc! {"
                [profile acct-admin]
                sso_start_url=https://x.awsapps.com/start
                sso_region=us-east-2
                sso_account_id=111
                sso_role_name=Admin
                region=us-east-2

                [profile other-acct-readonly]
                sso_start_url=https://x.awsapps.com/start
                sso_region=us-east-2
                sso_account_id=222
                sso_role_name=ReadOnly
                region=us-east-2
            "}
        );
    }

    #[tokio::test(start_paused = true)]
    async fn json_format() {
        let portal = FakePortal::default().account("111", "Acct", &[&["Admin"]]);
        let mut prompt: Vec<u8> = vec![];
        let document = generate(
            &config(crate::config::OutputFormat::Json),
            issuing_provider(),
            &portal,
            &mut prompt,
            std::future::pending(),
        )
        .await
        .unwrap();
        let parsed: Vec<crate::enumerator::RoleProfile> = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].profile_name, "acct-admin");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_skips_enumeration() {
        let portal = FakePortal::default().account("111", "Acct", &[&["Admin"]]);
        let mut prompt: Vec<u8> = vec![];
        let result = generate(
            &config(crate::config::OutputFormat::Config),
            Arc::new(ScriptedIdentityProvider::default()),
            &portal,
            &mut prompt,
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(crate::Error::PollTimeout(_))));
        assert!(portal.calls().is_empty());
        assert_eq!(String::from_utf8(prompt).unwrap().lines().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn enumeration_failure_yields_no_document() {
        let portal = FakePortal::default()
            .account("111", "A1", &[&["r1"]])
            .account("222", "A2", &[&["r2"]])
            .failing_on("222");
        let mut prompt: Vec<u8> = vec![];
        let result = generate(
            &config(crate::config::OutputFormat::Config),
            issuing_provider(),
            &portal,
            &mut prompt,
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(crate::Error::Enumeration(_))));
    }

    #[test]
    fn args_parse_with_defaults() {
        use clap::Parser;

        #[derive(clap::Parser)]
        struct Cli {
            #[clap(flatten)]
            args: GenerateArgs,
        }

        let cli = Cli::try_parse_from([
            "ssogen",
            "--poll-interval",
            "2s",
            "https://x.awsapps.com/start",
        ])
        .unwrap();
        assert_eq!(cli.args.poll_interval, Duration::from_secs(2));
        assert_eq!(cli.args.start_url.as_str(), "https://x.awsapps.com/start");

        let cli = Cli::try_parse_from(["ssogen", "https://X.awsapps.com"]).unwrap();
        assert_eq!(cli.args.start_url.as_str(), "https://X.awsapps.com");

        let config = cli.args.to_run_config().unwrap();
        assert!(config.poll_timeout >= config.poll_interval);
    }

    #[test]
    fn args_reject_bad_duration() {
        use clap::Parser;

        #[derive(clap::Parser)]
        struct Cli {
            #[clap(flatten)]
            args: GenerateArgs,
        }

        assert!(Cli::try_parse_from([
            "ssogen",
            "--poll-interval",
            "soon",
            "https://x.awsapps.com/start",
        ])
        .is_err());
    }
}
