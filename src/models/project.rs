use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::User;
use crate::validation::{is_valid_url, Issues, Validate};

static PROJECT_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("invalid project key regex"));

pub fn is_valid_project_key(key: &str) -> bool {
    PROJECT_KEY_REGEX.is_match(key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<User>,
}

impl Project {
    /// Returns the id/key/name projection carried by issues and entries.
    pub fn to_ref(&self) -> ProjectRef {
        ProjectRef {
            id: self.id.clone(),
            key: self.key.clone(),
            name: self.name.clone(),
        }
    }
}

/// Id/key/name projection of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: String,
    pub key: String,
    pub name: String,
}

impl ProjectRef {
    pub fn new(id: impl Into<String>, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
        }
    }
}

fn check_identity(issues: &mut Issues, id: &str, key: &str, name: &str) {
    issues.require_text("id", id);
    issues.ensure(
        is_valid_project_key(key),
        "key",
        "must be uppercase letters, digits or underscores, starting with a letter",
    );
    issues.require_text("name", name);
}

impl Validate for Project {
    fn check(&self, issues: &mut Issues) {
        check_identity(issues, &self.id, &self.key, &self.name);
        if let Some(url) = &self.avatar_url {
            issues.ensure(is_valid_url(url), "avatarUrl", "must be an http(s) URL");
        }
        if let Some(lead) = &self.lead {
            issues.nested("lead", lead);
        }
    }
}

impl Validate for ProjectRef {
    fn check(&self, issues: &mut Issues) {
        check_identity(issues, &self.id, &self.key, &self.name);
    }
}
