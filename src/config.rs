//! Report settings and the file-backed manager that persists them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::filter::{DateRangeType, FilterState};
use crate::grouping::GroupingConfig;
use crate::time_spent::{WorkCalendar, DEFAULT_WORKDAYS_PER_WEEK, DEFAULT_WORKDAY_HOURS};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;
const SETTINGS_FILE: &str = "settings.json";

/// Represents the persisted report settings: work calendar, paging limits and the
/// defaults applied to new reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub workday_hours: u8,
    pub workdays_per_week: u8,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_grouping: GroupingConfig,
    pub default_date_range: DateRangeType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workday_hours: DEFAULT_WORKDAY_HOURS,
            workdays_per_week: DEFAULT_WORKDAYS_PER_WEEK,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            default_grouping: GroupingConfig::default(),
            default_date_range: DateRangeType::ThisMonth,
        }
    }
}

impl Settings {
    /// Clamps every field into its accepted range.
    pub fn normalize(mut self) -> Self {
        self.workday_hours = self.workday_hours.clamp(1, 24);
        self.workdays_per_week = self.workdays_per_week.clamp(1, 7);
        self.max_page_size = self.max_page_size.clamp(1, MAX_PAGE_SIZE);
        self.default_page_size = self.default_page_size.clamp(1, self.max_page_size);
        self
    }

    pub fn work_calendar(&self) -> WorkCalendar {
        WorkCalendar::new(self.workday_hours, self.workdays_per_week)
    }

    /// Resolves a requested page size; `None` means the default.
    pub fn clamp_page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }

    /// Filter a new report starts from.
    pub fn default_filter(&self) -> FilterState {
        FilterState::with_range_type(self.default_date_range)
    }
}

/// Loads and saves [`Settings`] as JSON in the platform config directory.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager bound to `<config dir>/jira-timesheet/settings.json`.
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "jira-timesheet").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine config directory")
        })?;
        Ok(Self::with_path(dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        let parsed = fs::read_to_string(&self.path)
            .map_err(crate::error::Error::from)
            .and_then(|content| serde_json::from_str::<Settings>(&content).map_err(Into::into));
        match parsed {
            Ok(settings) => settings.normalize(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "ignoring unreadable settings file");
                Settings::default()
            }
        }
    }

    /// Persists settings, creating parent directories when needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&settings.clone().normalize())?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
