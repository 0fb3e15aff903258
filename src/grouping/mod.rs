//! Grouping configuration and the tree builder that folds entries into [`GroupNode`]s.

mod bucket;
mod builder;
mod node;

use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::validation::{Issues, Validate};

pub use bucket::DateBucket;
pub use builder::{build_group_tree, FALLBACK_VALUE};
pub use node::{GroupMetadata, GroupNode, GroupTotals, GroupTree};

/// Upper bound on nesting depth accepted by validation.
pub const MAX_GROUPING_LEVELS: usize = 6;

/// Granularity of a date grouping level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateGrouping {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Wire name of a dimension, without per-dimension configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionKind {
    Project,
    User,
    IssueType,
    Status,
    Date,
    Issue,
}

impl DimensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Project => "project",
            DimensionKind::User => "user",
            DimensionKind::IssueType => "issueType",
            DimensionKind::Status => "status",
            DimensionKind::Date => "date",
            DimensionKind::Issue => "issue",
        }
    }

    /// Label of the bucket collecting entries that lack this dimension.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            DimensionKind::Project => "No project",
            DimensionKind::User => "Unassigned",
            DimensionKind::IssueType => "No issue type",
            DimensionKind::Status => "No status",
            DimensionKind::Date => "No date",
            DimensionKind::Issue => "No issue",
        }
    }
}

/// Axis used at one grouping level. Only the date axis carries extra configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupDimension {
    Project,
    User,
    IssueType,
    Status,
    Issue,
    Date(DateGrouping),
}

impl GroupDimension {
    pub fn kind(&self) -> DimensionKind {
        match self {
            GroupDimension::Project => DimensionKind::Project,
            GroupDimension::User => DimensionKind::User,
            GroupDimension::IssueType => DimensionKind::IssueType,
            GroupDimension::Status => DimensionKind::Status,
            GroupDimension::Issue => DimensionKind::Issue,
            GroupDimension::Date(_) => DimensionKind::Date,
        }
    }

    pub fn date_grouping(&self) -> Option<DateGrouping> {
        match self {
            GroupDimension::Date(granularity) => Some(*granularity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Name,
    Hours,
    Count,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupingLevelWire {
    dimension: DimensionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_grouping_type: Option<DateGrouping>,
    #[serde(default)]
    sort_by: SortBy,
    #[serde(default)]
    sort_order: SortOrder,
    #[serde(default = "default_true")]
    expanded: bool,
}

/// One grouping level. Decoding rejects `dateGroupingType` on non-date levels and
/// date levels without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingLevel {
    pub dimension: GroupDimension,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub expanded: bool,
}

impl GroupingLevel {
    pub fn new(dimension: GroupDimension) -> Self {
        Self {
            dimension,
            sort_by: SortBy::Name,
            sort_order: SortOrder::Asc,
            expanded: true,
        }
    }

    pub fn sorted(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.expanded = false;
        self
    }
}

impl GroupingLevelWire {
    fn into_level(self) -> Result<GroupingLevel, String> {
        let dimension = match (self.dimension, self.date_grouping_type) {
            (DimensionKind::Date, Some(granularity)) => GroupDimension::Date(granularity),
            (DimensionKind::Date, None) => {
                return Err("dateGroupingType is required when dimension is date".to_string())
            }
            (kind, Some(_)) => {
                return Err(format!(
                    "dateGroupingType is only allowed when dimension is date, not {}",
                    kind.as_str()
                ))
            }
            (DimensionKind::Project, None) => GroupDimension::Project,
            (DimensionKind::User, None) => GroupDimension::User,
            (DimensionKind::IssueType, None) => GroupDimension::IssueType,
            (DimensionKind::Status, None) => GroupDimension::Status,
            (DimensionKind::Issue, None) => GroupDimension::Issue,
        };
        Ok(GroupingLevel {
            dimension,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            expanded: self.expanded,
        })
    }

    fn from_level(level: &GroupingLevel) -> Self {
        Self {
            dimension: level.dimension.kind(),
            date_grouping_type: level.dimension.date_grouping(),
            sort_by: level.sort_by,
            sort_order: level.sort_order,
            expanded: level.expanded,
        }
    }
}

impl Serialize for GroupingLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GroupingLevelWire::from_level(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GroupingLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        GroupingLevelWire::deserialize(deserializer)?
            .into_level()
            .map_err(D::Error::custom)
    }
}

/// Ordered grouping levels (outer to inner) plus presentation flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    #[serde(default)]
    pub levels: Vec<GroupingLevel>,
    #[serde(default = "default_true")]
    pub show_subtotals: bool,
    #[serde(default = "default_true")]
    pub show_grand_total: bool,
    #[serde(default)]
    pub collapse_empty_groups: bool,
}

impl Default for GroupingConfig {
    /// Groups by project name, showing subtotals and the grand total.
    fn default() -> Self {
        Self {
            levels: vec![GroupingLevel::new(GroupDimension::Project)],
            show_subtotals: true,
            show_grand_total: true,
            collapse_empty_groups: false,
        }
    }
}

impl GroupingConfig {
    /// No levels: every entry sits under one synthetic root.
    pub fn ungrouped() -> Self {
        Self {
            levels: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_levels(levels: Vec<GroupingLevel>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    pub fn is_grouped(&self) -> bool {
        !self.levels.is_empty()
    }
}

impl Validate for GroupingConfig {
    fn check(&self, issues: &mut Issues) {
        issues.ensure(
            self.levels.len() <= MAX_GROUPING_LEVELS,
            "levels",
            format!("must contain at most {MAX_GROUPING_LEVELS} levels"),
        );
    }
}
