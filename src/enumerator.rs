use crate::provider::{Account, Portal};

/// One (account, role) pair reachable with the access token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoleProfile {
    pub profile_name: String,
    pub role_name: String,
    pub account_id: String,
    pub account_name: String,
}

impl RoleProfile {
    /// Names the profile after the account name and role. An account name with nothing to slug
    /// is replaced by the account id, so the profile neither loses its account nor renders as
    /// `[profile ]`.
    pub fn new(account: &Account, role_name: impl Into<String>) -> Self {
        let role_name = role_name.into();
        let account_label = if crate::slug::slug(&account.account_name).is_empty() {
            &account.account_id
        } else {
            &account.account_name
        };
        Self {
            profile_name: crate::slug::profile_name(account_label, &role_name),
            role_name,
            account_id: account.account_id.clone(),
            account_name: account.account_name.clone(),
        }
    }
}

/// Walks every account page and, for each account, every role page, in provider order.
///
/// Roles of an account are fully drained before the next account is visited. The first failing
/// listing call aborts the whole walk with [`crate::Error::Enumeration`]; a partial list is never
/// returned.
#[tracing::instrument(skip_all)]
pub async fn enumerate<P>(
    portal: &P,
    token: &crate::token::TokenGrant,
) -> crate::Result<Vec<RoleProfile>>
where
    P: Portal + ?Sized,
{
    if token.is_expired() {
        return Err(crate::Error::Enumeration(
            "access token expired before listing accounts".to_owned(),
        ));
    }

    let mut profiles = vec![];
    let mut next_token: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        let page = portal
            .list_accounts(token, next_token.as_deref())
            .await
            .map_err(|e| into_enumeration_error(e, "sso:ListAccounts"))?;
        page_count += 1;
        tracing::debug!(page = page_count, accounts = page.items.len(), "sso:ListAccounts");

        for account in page.items.iter() {
            let roles = list_roles(portal, token, account).await?;
            profiles.extend(roles.into_iter().map(|r| RoleProfile::new(account, r)));
        }

        if page.is_last_page {
            break;
        }
        next_token = Some(continuation(page.next_token, "sso:ListAccounts")?);
    }

    tracing::info!(profiles = profiles.len(), "Enumerated roles");
    Ok(profiles)
}

async fn list_roles<P>(
    portal: &P,
    token: &crate::token::TokenGrant,
    account: &Account,
) -> crate::Result<Vec<String>>
where
    P: Portal + ?Sized,
{
    let mut roles = vec![];
    let mut next_token: Option<String> = None;
    loop {
        let page = portal
            .list_account_roles(token, &account.account_id, next_token.as_deref())
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account.account_id, err = ?e, "sso:ListAccountRoles failed");
                into_enumeration_error(e, "sso:ListAccountRoles")
            })?;
        tracing::debug!(account_id = %account.account_id, roles = page.items.len(), "sso:ListAccountRoles");
        roles.extend(page.items);

        if page.is_last_page {
            return Ok(roles);
        }
        next_token = Some(continuation(page.next_token, "sso:ListAccountRoles")?);
    }
}

fn continuation(next_token: Option<String>, operation: &str) -> crate::Result<String> {
    next_token.ok_or_else(|| {
        crate::Error::Enumeration(format!(
            "{operation} reported more pages but returned no next token"
        ))
    })
}

fn into_enumeration_error(e: crate::Error, operation: &str) -> crate::Error {
    match e {
        e @ crate::Error::Enumeration(_) => e,
        e => crate::Error::Enumeration(format!("{operation} failed: {e}")),
    }
}
