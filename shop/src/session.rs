//! Session and navigation.
//!
//! The catalog and checkout pages are only reachable with an identified user.

use crate::types::{Page, User};
use serde::{Deserialize, Serialize};

/// Shown when login is attempted with a blank identity
pub const EMAIL_REQUIRED: &str = "Email address is required.";

/// Who is shopping and which page they see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user: Option<User>,
    page: Page,
    login_error: Option<String>,
}

impl Session {
    /// The identified user, if any
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current page
    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }

    /// Error from the last rejected login
    #[must_use]
    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    /// Whether a user is identified
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Identify the user and show the catalog.
    ///
    /// Any non-empty identity is accepted; no credential is checked. A blank
    /// identity sets [`EMAIL_REQUIRED`] and changes nothing else.
    pub fn login(&mut self, identity: &str) -> bool {
        let email = identity.trim();

        if email.is_empty() {
            self.login_error = Some(EMAIL_REQUIRED.to_string());
            return false;
        }

        self.user = Some(User {
            email: email.to_string(),
        });
        self.page = Page::Catalog;
        self.login_error = None;
        true
    }

    /// Forget the user and return to the login page
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    /// Show `page`. Refused (returns `false`) without a user, unless the
    /// target is the login page.
    pub fn navigate(&mut self, page: Page) -> bool {
        if page != Page::Login && !self.is_authenticated() {
            return false;
        }

        self.page = page;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_trims_and_shows_catalog() {
        let mut session = Session::default();
        assert!(session.login("  shopper@example.com "));

        assert_eq!(
            session.user().map(|u| u.email.as_str()),
            Some("shopper@example.com")
        );
        assert_eq!(session.page(), Page::Catalog);
        assert!(session.login_error().is_none());
    }

    #[test]
    fn test_blank_login_is_rejected() {
        let mut session = Session::default();
        assert!(!session.login("   "));

        assert!(!session.is_authenticated());
        assert_eq!(session.page(), Page::Login);
        assert_eq!(session.login_error(), Some(EMAIL_REQUIRED));
    }

    #[test]
    fn test_pages_require_a_user() {
        let mut session = Session::default();
        assert!(!session.navigate(Page::Catalog));
        assert!(!session.navigate(Page::Checkout));
        assert_eq!(session.page(), Page::Login);

        session.login("a@b.c");
        assert!(session.navigate(Page::Checkout));
        assert_eq!(session.page(), Page::Checkout);
    }

    #[test]
    fn test_logout_returns_to_login() {
        let mut session = Session::default();
        session.login("a@b.c");
        session.navigate(Page::Checkout);

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.page(), Page::Login);
    }
}
