use crate::enumerator::RoleProfile;

/// Renders AWS shared config profile blocks, one per profile, in input order.
pub fn render(
    profiles: &[RoleProfile],
    region: &str,
    start_url: &crate::config::StartUrl,
) -> String {
    profiles
        .iter()
        .map(|p| {
            let name = &p.profile_name;
            let account_id = &p.account_id;
            let role_name = &p.role_name;
            indoc::formatdoc! {"
                [profile {name}]
                sso_start_url={start_url}
                sso_region={region}
                sso_account_id={account_id}
                sso_role_name={role_name}
                region={region}
            "}
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(profiles: &[RoleProfile]) -> crate::Result<String> {
    let mut json = serde_json::to_string_pretty(profiles)?;
    json.push('\n');
    Ok(json)
}
