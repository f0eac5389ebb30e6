//! Session handling around the hosted authentication widget.
//!
//! The widget owns sign-in. It reports each outcome to
//! [`Session::on_auth_result`], which stores the user and decides where the
//! dashboard should navigate next.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Paths served by the authentication widget.
pub const AUTH_PAGES: [&str; 6] = [
    "/login",
    "/signup",
    "/callback",
    "/error",
    "/prompt-password",
    "/reset-password",
];

/// Errors raised by the authentication provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("logout failed: {0}")]
    Logout(String),
}

/// The signed-in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user_id: String,
    #[serde(alias = "emailAddress")]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Outcome reported by the authentication widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The widget finished; `None` means nobody is signed in.
    Success(Option<AuthUser>),
    Failure(String),
}

/// Where the dashboard should go after an auth event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    To(String),
    Stay,
}

/// The external authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn logout(&self) -> Result<(), AuthError>;
}

/// Whether `path` (with or without a query string) is an auth page.
pub fn is_auth_page(path: &str) -> bool {
    let route = path.split('?').next().unwrap_or(path);
    AUTH_PAGES.iter().any(|page| route.starts_with(page))
}

/// The `redirect` query parameter of `path`, if any.
pub fn redirect_target(path: &str) -> Option<String> {
    let url = reqwest::Url::parse("http://dashboard.local")
        .and_then(|base| base.join(path))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "redirect")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Login path that returns to `path` after sign-in. The path is
/// form-encoded so its own query string survives the round trip.
pub fn login_redirect(path: &str) -> String {
    let mut url = match reqwest::Url::parse("http://dashboard.local/login") {
        Ok(url) => url,
        Err(_) => return "/login".to_string(),
    };
    url.query_pairs_mut().append_pair("redirect", path);
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Current authentication state of the dashboard.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<AuthUser>,
    initialized: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// True once the widget has reported at least one success.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Apply a widget result while the browser is on `current_path`.
    pub fn on_auth_result(&mut self, result: AuthResult, current_path: &str) -> Navigation {
        match result {
            AuthResult::Success(Some(user)) => {
                self.initialized = true;
                info!("Signed in as {}", user.email);
                self.user = Some(user);

                if let Some(target) = redirect_target(current_path) {
                    Navigation::To(target)
                } else if is_auth_page(current_path) {
                    Navigation::To("/".to_string())
                } else {
                    Navigation::Stay
                }
            }
            AuthResult::Success(None) => {
                self.initialized = true;
                self.user = None;

                if is_auth_page(current_path) {
                    Navigation::Stay
                } else {
                    Navigation::To(login_redirect(current_path))
                }
            }
            AuthResult::Failure(reason) => {
                error!("Authentication failed: {}", reason);
                Navigation::Stay
            }
        }
    }

    /// Sign out through the provider. The user is only cleared when the
    /// provider succeeds.
    pub async fn logout(&mut self, provider: &dyn AuthProvider) -> Result<Navigation, AuthError> {
        provider.logout().await.map_err(|e| {
            error!("{}", e);
            e
        })?;
        self.user = None;
        Ok(Navigation::To("/login".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> AuthUser {
        AuthUser {
            user_id: "u-1".to_string(),
            email: "admin@edutrack.com".to_string(),
            first_name: Some("John".to_string()),
            last_name: None,
        }
    }

    struct FakeProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AuthProvider for FakeProvider {
        async fn logout(&self) -> Result<(), AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AuthError::Logout("widget unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_auth_pages() {
        assert!(is_auth_page("/login"));
        assert!(is_auth_page("/signup?redirect=/students"));
        assert!(is_auth_page("/reset-password"));
        assert!(!is_auth_page("/students"));
        assert!(!is_auth_page("/"));
    }

    #[test]
    fn test_redirect_target() {
        assert_eq!(
            redirect_target("/login?redirect=/analytics").as_deref(),
            Some("/analytics")
        );
        assert_eq!(redirect_target("/login"), None);
        assert_eq!(redirect_target("/login?redirect="), None);
    }

    #[test]
    fn test_login_redirect_encodes_query() {
        let login = login_redirect("/students?course=MBA&intake=July 2024");
        assert_eq!(
            login,
            "/login?redirect=%2Fstudents%3Fcourse%3DMBA%26intake%3DJuly+2024"
        );
        assert!(is_auth_page(&login));
        assert_eq!(
            redirect_target(&login).as_deref(),
            Some("/students?course=MBA&intake=July 2024")
        );
    }

    #[test]
    fn test_signed_out_round_trip_keeps_query() {
        let mut session = Session::new();
        let nav = session.on_auth_result(AuthResult::Success(None), "/applications?agent=1&campus=2");
        let login = match nav {
            Navigation::To(login) => login,
            Navigation::Stay => panic!("expected a redirect to login"),
        };

        let nav = session.on_auth_result(AuthResult::Success(Some(user())), &login);
        assert_eq!(
            nav,
            Navigation::To("/applications?agent=1&campus=2".to_string())
        );
    }

    #[test]
    fn test_sign_in_follows_redirect() {
        let mut session = Session::new();
        let nav = session.on_auth_result(
            AuthResult::Success(Some(user())),
            "/login?redirect=/applications",
        );
        assert_eq!(nav, Navigation::To("/applications".to_string()));
        assert_eq!(session.user().map(|u| u.user_id.as_str()), Some("u-1"));
        assert!(session.is_initialized());
    }

    #[test]
    fn test_sign_in_on_auth_page_goes_home() {
        let mut session = Session::new();
        let nav = session.on_auth_result(AuthResult::Success(Some(user())), "/callback");
        assert_eq!(nav, Navigation::To("/".to_string()));
    }

    #[test]
    fn test_sign_in_elsewhere_stays() {
        let mut session = Session::new();
        let nav = session.on_auth_result(AuthResult::Success(Some(user())), "/analytics");
        assert_eq!(nav, Navigation::Stay);
    }

    #[test]
    fn test_signed_out_is_sent_to_login() {
        let mut session = Session::new();
        session.on_auth_result(AuthResult::Success(Some(user())), "/");
        let nav = session.on_auth_result(AuthResult::Success(None), "/students");
        assert_eq!(nav, Navigation::To("/login?redirect=%2Fstudents".to_string()));
        assert!(session.user().is_none());

        let nav = session.on_auth_result(AuthResult::Success(None), "/signup");
        assert_eq!(nav, Navigation::Stay);
    }

    #[test]
    fn test_failure_keeps_state() {
        let mut session = Session::new();
        session.on_auth_result(AuthResult::Success(Some(user())), "/");
        let nav = session.on_auth_result(AuthResult::Failure("popup closed".to_string()), "/");
        assert_eq!(nav, Navigation::Stay);
        assert!(session.user().is_some());
    }

    #[test]
    fn test_user_accepts_widget_field_names() {
        let parsed: AuthUser = serde_json::from_str(
            r#"{"userId": "u-9", "emailAddress": "s@x.com", "firstName": "Sarah"}"#,
        )
        .unwrap();
        assert_eq!(parsed.email, "s@x.com");
        assert_eq!(parsed.first_name.as_deref(), Some("Sarah"));
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let mut session = Session::new();
        session.on_auth_result(AuthResult::Success(Some(user())), "/");

        let nav = session.logout(&provider).await.unwrap();
        assert_eq!(nav, Navigation::To("/login".to_string()));
        assert!(session.user().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_user() {
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let mut session = Session::new();
        session.on_auth_result(AuthResult::Success(Some(user())), "/");

        assert!(session.logout(&provider).await.is_err());
        assert!(session.user().is_some());
    }
}
