//! Session cookie accumulation.

use std::fmt;

/// The cookie field of one handshake attempt.
///
/// Append-only: values are added in the order they were received and never
/// replaced, joined with `"; "`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    field: String,
}

impl SessionCookies {
    /// Creates an empty cookie field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no cookie has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    /// The accumulated `Cookie` header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.field
    }

    /// Appends a `name=value` pair (or several, already joined).
    pub fn append(&mut self, cookie: &str) {
        let cookie = cookie.trim().trim_end_matches(';').trim();
        if cookie.is_empty() {
            return;
        }
        if !self.field.is_empty() {
            self.field.push_str("; ");
        }
        self.field.push_str(cookie);
    }

    /// Captures the `name=value` part of each `Set-Cookie` value.
    ///
    /// Returns how many cookies were added.
    pub fn absorb_set_cookie<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for value in values {
            let pair = value.split(';').next().unwrap_or_default().trim();
            if pair.contains('=') {
                self.append(pair);
                added += 1;
            }
        }
        added
    }

    /// Cookie header value with `extra` appended after the session cookies.
    #[must_use]
    pub fn merged_with(&self, extra: Option<&str>) -> Option<String> {
        let mut merged = self.clone();
        if let Some(extra) = extra {
            merged.append(extra);
        }
        (!merged.is_empty()).then_some(merged.field)
    }

    /// Names of the captured cookies.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.field
            .split("; ")
            .filter_map(|pair| pair.split_once('=').map(|(name, _)| name))
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are session secrets.
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order() {
        let mut cookies = SessionCookies::new();
        assert!(cookies.is_empty());
        cookies.append("a=1");
        cookies.append("b=2;");
        cookies.append("  ");
        assert_eq!(cookies.as_str(), "a=1; b=2");
    }

    #[test]
    fn set_cookie_attributes_are_dropped() {
        let mut cookies = SessionCookies::new();
        let added = cookies.absorb_set_cookie([
            "_shibsession_1=abc; path=/; secure; HttpOnly",
            "garbage",
            "lang=en",
        ]);
        assert_eq!(added, 2);
        assert_eq!(cookies.as_str(), "_shibsession_1=abc; lang=en");
    }

    #[test]
    fn same_name_is_not_replaced() {
        let mut cookies = SessionCookies::new();
        cookies.absorb_set_cookie(["s=1"]);
        cookies.absorb_set_cookie(["s=2"]);
        assert_eq!(cookies.as_str(), "s=1; s=2");
    }

    #[test]
    fn merge_keeps_session_first() {
        let mut cookies = SessionCookies::new();
        assert_eq!(cookies.merged_with(None), None);
        assert_eq!(cookies.merged_with(Some("CSRF=x")).as_deref(), Some("CSRF=x"));

        cookies.append("sess=abc123");
        assert_eq!(
            cookies.merged_with(Some("CSRF=x")).as_deref(),
            Some("sess=abc123; CSRF=x")
        );
        assert_eq!(cookies.as_str(), "sess=abc123");
    }

    #[test]
    fn debug_hides_values() {
        let mut cookies = SessionCookies::new();
        cookies.append("sess=secret");
        let debug = format!("{cookies:?}");
        assert!(debug.contains("sess"));
        assert!(!debug.contains("secret"));
    }
}
