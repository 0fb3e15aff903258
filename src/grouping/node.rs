use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateGrouping, DimensionKind};
use crate::models::StatusCategory;

/// Dimension-specific details kept on a node so consumers need not re-derive them from `value`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupMetadata {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Project {
        project_id: String,
        project_key: String,
        project_name: String,
    },
    #[serde(rename_all = "camelCase")]
    User {
        account_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_address: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    IssueType {
        issue_type_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Status {
        status_id: String,
        category: StatusCategory,
    },
    #[serde(rename_all = "camelCase")]
    Issue {
        issue_id: String,
        issue_key: String,
        summary: String,
    },
    #[serde(rename_all = "camelCase")]
    Date {
        start: NaiveDate,
        end: NaiveDate,
        granularity: DateGrouping,
    },
}

/// One node of the grouped forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: String,
    /// Absent only on the synthetic root produced when no levels are configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionKind>,
    pub value: String,
    pub label: String,
    pub level: usize,
    pub total_hours: f64,
    pub entry_count: usize,
    pub children: Vec<GroupNode>,
    pub entries: Vec<String>,
    pub is_expanded: bool,
    #[serde(default)]
    pub metadata: GroupMetadata,
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk over this node and all descendants.
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a GroupNode),
    {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Ids of every entry owned anywhere in this subtree, in tree order.
    pub fn subtree_entry_ids(&self) -> Vec<&str> {
        let mut ids = Vec::with_capacity(self.entry_count);
        collect_entry_ids(self, &mut ids);
        ids
    }
}

fn collect_entry_ids<'a>(node: &'a GroupNode, ids: &mut Vec<&'a str>) {
    ids.extend(node.entries.iter().map(String::as_str));
    for child in &node.children {
        collect_entry_ids(child, ids);
    }
}

fn count_nodes(nodes: &[GroupNode]) -> usize {
    nodes.iter().map(|node| 1 + count_nodes(&node.children)).sum()
}

fn find_node<'a>(nodes: &'a [GroupNode], id: &str) -> Option<&'a GroupNode> {
    nodes.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_node(&node.children, id)
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    pub total_hours: f64,
    pub entry_count: usize,
}

/// Builder output: the forest plus presentation flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTree {
    pub nodes: Vec<GroupNode>,
    pub show_subtotals: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<GroupTotals>,
}

impl GroupTree {
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a GroupNode),
    {
        for node in &self.nodes {
            node.visit(f);
        }
    }

    pub fn node_count(&self) -> usize {
        count_nodes(&self.nodes)
    }

    pub fn find(&self, id: &str) -> Option<&GroupNode> {
        find_node(&self.nodes, id)
    }
}
