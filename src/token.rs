#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: secrecy::SecretString,
    pub token_type: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TokenGrant {
    pub fn new(
        access_token: impl Into<String>,
        token_type: Option<String>,
        expires_in: Option<std::time::Duration>,
    ) -> Self {
        let expires_at = expires_in
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .and_then(|d| chrono::Utc::now().checked_add_signed(d));
        Self {
            access_token: access_token.into().into(),
            token_type,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|t| t <= chrono::Utc::now())
            .unwrap_or(false)
    }
}
