//! Utility functions

/// Masks the local part of an email for log output (`jo***@example.com`).
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(0) | None => "***".to_string(),
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let keep = if local.chars().count() <= 2 { 1 } else { 2 };
            let prefix: String = local.chars().take(keep).collect();
            format!("{}***{}", prefix, domain)
        }
    }
}

/// Returns everything before the first `@`, or the whole input when there is none.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Joins a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
