use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

fn default_active() -> bool {
    true
}

/// User payload as returned by `/rest/api/3/user` and embedded in issues and worklogs.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    #[serde(deserialize_with = "deserialize_id")]
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
    /// Keyed by size, e.g. `48x48`.
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraProject {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_type_key: Option<String>,
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub lead: Option<JiraUser>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueType {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraStatusCategory {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraStatus {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status_category: Option<JiraStatusCategory>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraPriority {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraParent {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "issuetype")]
    pub issue_type: Option<JiraIssueType>,
    #[serde(default)]
    pub status: Option<JiraStatus>,
    #[serde(default)]
    pub priority: Option<JiraPriority>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub reporter: Option<JiraUser>,
    pub project: JiraProject,
    #[serde(default)]
    pub parent: Option<JiraParent>,
    pub created: String,
    pub updated: String,
}

/// Issue payload from `/rest/api/3/search`; everything but identity lives under `fields`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssue {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub key: String,
    pub fields: JiraIssueFields,
}

/// Worklog payload from `/rest/api/3/issue/{key}/worklog`.
///
/// `comment` is either plain text or an Atlassian Document Format tree.
/// Jira sends both `timeSpent` and `timeSpentSeconds`; older servers may omit the latter.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraWorklog {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub author: Option<JiraUser>,
    #[serde(default)]
    pub comment: Option<Value>,
    pub started: String,
    #[serde(default)]
    pub time_spent: Option<String>,
    #[serde(default)]
    pub time_spent_seconds: Option<i64>,
    pub created: String,
    pub updated: String,
}

/// Page wrapper around worklog lists.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JiraWorklogPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub worklogs: Vec<JiraWorklog>,
}

fn id_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Jira ids arrive as strings on cloud and as numbers on some server versions.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_text(value).ok_or_else(|| D::Error::custom("expected a non-empty string or number id"))
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_decode_to_strings() {
        let worklog: JiraWorklog = serde_json::from_value(json!({
            "id": 9001,
            "issueId": " 10001 ",
            "started": "2024-01-15T09:00:00.000+0000",
            "timeSpentSeconds": 3600,
            "created": "2024-01-15T10:00:00.000+0000",
            "updated": "2024-01-15T10:00:00.000+0000"
        }))
        .expect("worklog decodes");
        assert_eq!(worklog.id, "9001");
        assert_eq!(worklog.issue_id.as_deref(), Some("10001"));
        assert!(worklog.author.is_none());
        assert!(worklog.time_spent.is_none());
    }

    #[test]
    fn blank_required_id_is_rejected() {
        let result = serde_json::from_value::<JiraUser>(json!({"accountId": "  "}));
        assert!(result.is_err());
        let result = serde_json::from_value::<JiraUser>(json!({"displayName": "Ada"}));
        assert!(result.is_err());
    }

    #[test]
    fn issue_fields_use_jira_names() {
        let issue: JiraIssue = serde_json::from_value(json!({
            "id": "10001",
            "key": "ABC-1",
            "fields": {
                "summary": "Write docs",
                "issuetype": {"id": 1, "name": "Task", "subtask": false},
                "status": {
                    "id": "3",
                    "name": "In Progress",
                    "statusCategory": {"key": "indeterminate"}
                },
                "project": {"id": "100", "key": "ABC", "name": "Alpha"},
                "parent": {"key": "ABC-0"},
                "created": "2024-01-01T09:00:00.000+0000",
                "updated": "2024-01-02T09:00:00.000+0000"
            }
        }))
        .expect("issue decodes");
        assert_eq!(issue.fields.issue_type.map(|t| t.id), Some("1".to_string()));
        assert_eq!(issue.fields.parent.map(|p| p.key), Some("ABC-0".to_string()));
        assert!(issue.fields.assignee.is_none());
    }
}
