//! Canonical user model shared by entries, issues and projects.

use serde::{Deserialize, Serialize};

use crate::validation::{is_valid_email, is_valid_url, Issues, Validate};

fn default_active() -> bool {
    true
}

/// Represents a Jira account as seen by the timesheet tool, including display/email
/// and avatar metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub account_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl User {
    pub fn new(account_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: display_name.into(),
            email_address: None,
            avatar_url: None,
            active: true,
            time_zone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Returns the best human label: display name, then email, then account id.
    pub fn label(&self) -> &str {
        let display = self.display_name.trim();
        if !display.is_empty() {
            return display;
        }
        self.email_address
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .unwrap_or(&self.account_id)
    }
}

impl Validate for User {
    fn check(&self, issues: &mut Issues) {
        issues.require_text("accountId", &self.account_id);
        issues.require_text("displayName", &self.display_name);
        if let Some(email) = &self.email_address {
            issues.ensure(is_valid_email(email), "emailAddress", "must be a valid email address");
        }
        if let Some(url) = &self.avatar_url {
            issues.ensure(is_valid_url(url), "avatarUrl", "must be an http(s) URL");
        }
    }
}
