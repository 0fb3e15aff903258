//! Group tree builder.
//!
//! Partitions entries level by level (outer to inner), keeps buckets in
//! first-seen order, then sorts siblings per level. Only nodes on the
//! innermost level own entries directly; aggregates are computed after a
//! node's children are finalized.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::{
    DimensionKind, GroupDimension, GroupMetadata, GroupNode, GroupTotals, GroupTree,
    GroupingConfig, GroupingLevel, SortBy, SortOrder,
};
use crate::models::TimesheetEntry;

const ROOT_ID: &str = "all";
const ROOT_LABEL: &str = "All entries";
/// Value of the bucket holding entries that lack the level's dimension.
pub const FALLBACK_VALUE: &str = "(none)";

struct GroupKey {
    value: String,
    label: String,
    metadata: GroupMetadata,
    bucket_start: Option<NaiveDate>,
    fallback: bool,
}

impl GroupKey {
    fn fallback(kind: DimensionKind) -> Self {
        Self {
            value: FALLBACK_VALUE.to_string(),
            label: kind.fallback_label().to_string(),
            metadata: GroupMetadata::None,
            bucket_start: None,
            fallback: true,
        }
    }

    fn plain(value: &str, label: &str, metadata: GroupMetadata) -> Self {
        let label = label.trim();
        Self {
            value: value.to_string(),
            label: if label.is_empty() { value } else { label }.to_string(),
            metadata,
            bucket_start: None,
            fallback: false,
        }
    }

    /// Node id segment. Fallback segments carry no `:value` part, so they never
    /// collide with a real value.
    fn id_segment(&self, kind: DimensionKind) -> String {
        if self.fallback {
            kind.as_str().to_string()
        } else {
            format!("{}:{}", kind.as_str(), escape_id_value(&self.value))
        }
    }
}

/// Escapes `%` and the `/` segment separator so every value maps to a distinct segment.
fn escape_id_value(value: &str) -> String {
    value.replace('%', "%25").replace('/', "%2F")
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Derives the grouping key of `entry` at one level; `None` sends it to the fallback bucket.
fn group_key(entry: &TimesheetEntry, dimension: GroupDimension) -> Option<GroupKey> {
    match dimension {
        GroupDimension::Project => non_blank(&entry.project.id).map(|id| {
            let project = &entry.project;
            let label = non_blank(&project.name).unwrap_or(project.key.as_str());
            GroupKey::plain(
                id,
                label,
                GroupMetadata::Project {
                    project_id: id.to_string(),
                    project_key: project.key.clone(),
                    project_name: project.name.clone(),
                },
            )
        }),
        GroupDimension::User => {
            let author = entry.author.as_ref()?;
            let id = non_blank(&author.account_id)?;
            Some(GroupKey::plain(
                id,
                author.label(),
                GroupMetadata::User {
                    account_id: id.to_string(),
                    email_address: author.email_address.clone(),
                    avatar_url: author.avatar_url.clone(),
                },
            ))
        }
        GroupDimension::IssueType => {
            let issue_type = entry.issue.issue_type.as_ref()?;
            let id = non_blank(&issue_type.id)?;
            Some(GroupKey::plain(
                id,
                &issue_type.name,
                GroupMetadata::IssueType {
                    issue_type_id: id.to_string(),
                    icon_url: issue_type.icon_url.clone(),
                },
            ))
        }
        GroupDimension::Status => {
            let status = entry.issue.status.as_ref()?;
            let id = non_blank(&status.id)?;
            Some(GroupKey::plain(
                id,
                &status.name,
                GroupMetadata::Status {
                    status_id: id.to_string(),
                    category: status.category,
                },
            ))
        }
        GroupDimension::Issue => non_blank(&entry.issue.id).map(|id| {
            let issue = &entry.issue;
            let label = match non_blank(&issue.summary) {
                Some(summary) => format!("{}: {}", issue.key, summary),
                None => issue.key.clone(),
            };
            GroupKey::plain(
                id,
                &label,
                GroupMetadata::Issue {
                    issue_id: id.to_string(),
                    issue_key: issue.key.clone(),
                    summary: issue.summary.clone(),
                },
            )
        }),
        GroupDimension::Date(granularity) => {
            let bucket = granularity.bucket(entry.started);
            Some(GroupKey {
                value: bucket.value,
                label: bucket.label,
                metadata: GroupMetadata::Date {
                    start: bucket.start,
                    end: bucket.end,
                    granularity,
                },
                bucket_start: Some(bucket.start),
                fallback: false,
            })
        }
    }
}

struct Bucket<'e> {
    key: GroupKey,
    entries: Vec<&'e TimesheetEntry>,
}

/// Splits entries by key, keeping buckets and their members in first-seen order.
fn partition<'e>(entries: &[&'e TimesheetEntry], dimension: GroupDimension) -> Vec<Bucket<'e>> {
    // `None` is the fallback bucket, kept apart from every real value.
    let mut positions: HashMap<Option<String>, usize> = HashMap::new();
    let mut buckets: Vec<Bucket<'e>> = Vec::new();
    for &entry in entries {
        let key = group_key(entry, dimension)
            .unwrap_or_else(|| GroupKey::fallback(dimension.kind()));
        let slot = (!key.fallback).then(|| key.value.clone());
        match positions.get(&slot) {
            Some(&position) => buckets[position].entries.push(entry),
            None => {
                positions.insert(slot, buckets.len());
                buckets.push(Bucket {
                    key,
                    entries: vec![entry],
                });
            }
        }
    }
    buckets
}

struct Sibling {
    node: GroupNode,
    sort_date: Option<NaiveDate>,
    fallback: bool,
}

fn build_level(
    entries: &[&TimesheetEntry],
    levels: &[GroupingLevel],
    depth: usize,
    parent_id: Option<&str>,
) -> Vec<GroupNode> {
    let Some(level) = levels.get(depth) else {
        return Vec::new();
    };
    let kind = level.dimension.kind();
    let innermost = depth + 1 == levels.len();

    let mut siblings: Vec<Sibling> = partition(entries, level.dimension)
        .into_iter()
        .map(|bucket| {
            let segment = bucket.key.id_segment(kind);
            let id = match parent_id {
                Some(parent) => format!("{parent}/{segment}"),
                None => segment,
            };
            let (children, owned) = if innermost {
                (Vec::new(), bucket.entries.as_slice())
            } else {
                let children = build_level(&bucket.entries, levels, depth + 1, Some(id.as_str()));
                (children, &[][..])
            };
            let earliest = bucket.entries.iter().map(|entry| entry.started).min();

            let total_hours = children.iter().map(|child| child.total_hours).sum::<f64>()
                + owned.iter().map(|entry| entry.time_spent_hours).sum::<f64>();
            let entry_count =
                children.iter().map(|child| child.entry_count).sum::<usize>() + owned.len();

            let node = GroupNode {
                id,
                dimension: Some(kind),
                value: bucket.key.value,
                label: bucket.key.label,
                level: depth,
                total_hours,
                entry_count,
                entries: owned.iter().map(|entry| entry.id.clone()).collect(),
                children,
                is_expanded: level.expanded,
                metadata: bucket.key.metadata,
            };
            Sibling {
                node,
                sort_date: bucket.key.bucket_start.or(earliest),
                fallback: bucket.key.fallback,
            }
        })
        .collect();

    sort_siblings(&mut siblings, level);
    siblings.into_iter().map(|sibling| sibling.node).collect()
}

fn compare_labels(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Orders by the level's sort key, then by grouping value ascending, real buckets
/// before the fallback. The sort is stable.
fn sort_siblings(siblings: &mut [Sibling], level: &GroupingLevel) {
    siblings.sort_by(|a, b| {
        let primary = match level.sort_by {
            SortBy::Name => compare_labels(&a.node.label, &b.node.label),
            SortBy::Hours => a.node.total_hours.total_cmp(&b.node.total_hours),
            SortBy::Count => a.node.entry_count.cmp(&b.node.entry_count),
            SortBy::Date => a.sort_date.cmp(&b.sort_date),
        };
        let primary = match level.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary
            .then_with(|| a.node.value.cmp(&b.node.value))
            .then_with(|| a.fallback.cmp(&b.fallback))
    });
}

/// Drops nodes whose subtree holds no entries, bottom-up.
fn prune_empty(nodes: Vec<GroupNode>) -> Vec<GroupNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            node.children = prune_empty(std::mem::take(&mut node.children));
            let keep =
                node.entry_count > 0 || !node.entries.is_empty() || !node.children.is_empty();
            keep.then_some(node)
        })
        .collect()
}

fn synthetic_root(entries: &[TimesheetEntry]) -> GroupNode {
    GroupNode {
        id: ROOT_ID.to_string(),
        dimension: None,
        value: ROOT_ID.to_string(),
        label: ROOT_LABEL.to_string(),
        level: 0,
        total_hours: entries.iter().map(|entry| entry.time_spent_hours).sum(),
        entry_count: entries.len(),
        children: Vec::new(),
        entries: entries.iter().map(|entry| entry.id.clone()).collect(),
        is_expanded: true,
        metadata: GroupMetadata::None,
    }
}

fn log_repeated_dimensions(levels: &[GroupingLevel]) {
    for (index, level) in levels.iter().enumerate() {
        if levels[..index].iter().any(|outer| outer.dimension == level.dimension) {
            debug!(
                level = index,
                dimension = level.dimension.kind().as_str(),
                "grouping dimension repeats an outer level"
            );
        }
    }
}

/// Folds already-filtered entries into a forest according to `config`.
///
/// With no levels the forest is a single synthetic root owning every entry.
/// Entries lacking a dimension value are grouped under that dimension's
/// fallback bucket rather than dropped. Input entries are never modified.
pub fn build_group_tree(entries: &[TimesheetEntry], config: &GroupingConfig) -> GroupTree {
    log_repeated_dimensions(&config.levels);

    let nodes = if config.levels.is_empty() {
        vec![synthetic_root(entries)]
    } else {
        let refs: Vec<&TimesheetEntry> = entries.iter().collect();
        let nodes = build_level(&refs, &config.levels, 0, None);
        if config.collapse_empty_groups {
            prune_empty(nodes)
        } else {
            nodes
        }
    };

    let grand_total = config.show_grand_total.then(|| GroupTotals {
        total_hours: nodes.iter().map(|node| node.total_hours).sum(),
        entry_count: nodes.iter().map(|node| node.entry_count).sum(),
    });

    let tree = GroupTree {
        nodes,
        show_subtotals: config.show_subtotals,
        grand_total,
    };
    debug!(
        entries = entries.len(),
        levels = config.levels.len(),
        nodes = tree.node_count(),
        "built group tree"
    );
    tree
}
