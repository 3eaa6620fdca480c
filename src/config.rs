pub const DEFAULT_REGION: &str = "us-east-2";
pub const DEFAULT_CLIENT_NAME: &str = "sso-configurator";

/// Inputs fixed before the flow begins. Construct with [`RunConfig::new`] so the
/// polling bounds are checked up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub region: String,
    pub client_name: String,
    pub poll_interval: std::time::Duration,
    pub poll_timeout: std::time::Duration,
    pub start_url: StartUrl,
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn new(
        region: String,
        client_name: String,
        poll_interval: std::time::Duration,
        poll_timeout: std::time::Duration,
        start_url: StartUrl,
        format: OutputFormat,
    ) -> crate::Result<Self> {
        let config = Self {
            region,
            client_name,
            poll_interval,
            poll_timeout,
            start_url,
            format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.region.trim().is_empty() {
            return Err(crate::Error::Config("region must not be empty".to_owned()));
        }
        if self.client_name.trim().is_empty() {
            return Err(crate::Error::Config(
                "client name must not be empty".to_owned(),
            ));
        }
        validate_start_url(&self.start_url)?;
        validate_poll_bounds(self.poll_interval, self.poll_timeout)
    }
}

/// SSO start URL as the operator typed it.
///
/// The parsed form is only used for validation; everything sent to the provider or written to the
/// config file uses the original text, since `url::Url` normalizes case and trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartUrl {
    raw: String,
    parsed: url::Url,
}

impl StartUrl {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &url::Url {
        &self.parsed
    }
}

impl std::str::FromStr for StartUrl {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<StartUrl, crate::Error> {
        let parsed = url::Url::parse(s)
            .map_err(|e| crate::Error::Config(format!("invalid start URL '{s}': {e}")))?;
        Ok(StartUrl {
            raw: s.to_owned(),
            parsed,
        })
    }
}

impl std::fmt::Display for StartUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn validate_start_url(url: &StartUrl) -> crate::Result<()> {
    match url.url().scheme() {
        "https" | "http" => {}
        s => {
            return Err(crate::Error::Config(format!(
                "start URL must be http(s), got '{s}': {url}"
            )))
        }
    }
    if url.url().host_str().map(str::is_empty).unwrap_or(true) {
        return Err(crate::Error::Config(format!(
            "start URL has no host: {url}"
        )));
    }
    Ok(())
}

pub fn validate_poll_bounds(
    interval: std::time::Duration,
    timeout: std::time::Duration,
) -> crate::Result<()> {
    if interval.is_zero() {
        return Err(crate::Error::Config(
            "poll interval must be positive".to_owned(),
        ));
    }
    if timeout < interval {
        return Err(crate::Error::Config(format!(
            "poll timeout ({timeout:?}) must not be shorter than poll interval ({interval:?})"
        )));
    }
    Ok(())
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Config,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<OutputFormat, crate::Error> {
        match s {
            "config" => Ok(OutputFormat::Config),
            "json" => Ok(OutputFormat::Json),
            _ => Err(crate::Error::Config(format!("unknown --format: {s}"))),
        }
    }
}

/// Parses durations like `5s`, `1m30s` or `250ms`.
pub fn parse_duration(s: &str) -> crate::Result<std::time::Duration> {
    let invalid = || crate::Error::Config(format!("invalid duration: '{s}'"));

    let s = s.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(std::time::Duration::ZERO);
    }

    let mut total = std::time::Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let part = std::time::Duration::try_from_secs_f64(value * scale).map_err(|_| invalid())?;
        total = total.checked_add(part).ok_or_else(invalid)?;
    }
    Ok(total)
}
