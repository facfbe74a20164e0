use serde::{Deserialize, Serialize};

pub const DEFAULT_AFTER_LOGIN: &str = "/admin/dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
    #[serde(default)]
    pub expires_in: u64,
}

/// Paths that require a session.
pub fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Where an unauthenticated visitor of `path` is sent.
pub fn login_redirect_url(path: &str) -> String {
    format!("/login?redirect={path}")
}

/// Accept only same-origin absolute paths as post-login targets.
pub fn safe_redirect(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => DEFAULT_AFTER_LOGIN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_paths() {
        assert!(is_admin_path("/admin"));
        assert!(is_admin_path("/admin/dashboard"));
        assert!(!is_admin_path("/administrator"));
        assert!(!is_admin_path("/venues"));
    }

    #[test]
    fn redirect_rejects_foreign_targets() {
        assert_eq!(safe_redirect(Some("/venues")), "/venues");
        assert_eq!(safe_redirect(Some("//evil.example")), DEFAULT_AFTER_LOGIN);
        assert_eq!(safe_redirect(Some("https://evil.example")), DEFAULT_AFTER_LOGIN);
        assert_eq!(safe_redirect(Some("/\\evil.example")), DEFAULT_AFTER_LOGIN);
        assert_eq!(safe_redirect(None), DEFAULT_AFTER_LOGIN);
    }

    #[test]
    fn login_redirect_carries_path() {
        assert_eq!(
            login_redirect_url("/admin/dashboard"),
            "/login?redirect=/admin/dashboard"
        );
    }

    #[test]
    fn auth_response_decodes_camel_case() {
        let body = r#"{"token":"t","user":{"id":"1","email":"a@b.c"},"expiresIn":3600}"#;
        let resp: AuthResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.expires_in, 3600);
        assert_eq!(resp.user.name, None);
    }
}
