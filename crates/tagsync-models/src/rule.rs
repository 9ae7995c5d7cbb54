use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A configured mapping from one remote list to a managed tag and,
/// optionally, a managed group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagedRule {
    #[serde(rename = "tag")]
    pub tag_name: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "limit", default = "default_item_limit")]
    pub item_limit: usize,
    #[serde(default = "default_true")]
    pub active: bool,
    /// IMDb or TMDb ids never tagged by this rule.
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default, rename = "schedule")]
    pub activation_intervals: Vec<ActivationInterval>,
    #[serde(default, rename = "group")]
    pub grouping_enabled: bool,
    /// Defaults to the tag name when blank.
    #[serde(default)]
    pub group_name: String,
    /// Only maintain the group, never the tag.
    #[serde(default, rename = "group_only")]
    pub tag_disabled: bool,
}

impl ManagedRule {
    pub fn new(tag_name: impl Into<String>, source_url: impl Into<String>, item_limit: usize) -> Self {
        Self {
            tag_name: tag_name.into(),
            source_url: source_url.into(),
            item_limit,
            active: true,
            blacklist: Vec::new(),
            activation_intervals: Vec::new(),
            grouping_enabled: false,
            group_name: String::new(),
            tag_disabled: false,
        }
    }

    pub fn tag(&self) -> &str {
        self.tag_name.trim()
    }

    /// The group this rule maintains, falling back to the tag name.
    pub fn effective_group_name(&self) -> &str {
        let name = self.group_name.trim();
        if name.is_empty() {
            self.tag()
        } else {
            name
        }
    }

    pub fn is_blacklisted(&self, item: &crate::ExternalItem) -> bool {
        self.blacklist.iter().any(|entry| item.is_blacklisted_by(entry))
    }
}

/// When a rule is allowed to run. A rule with no intervals always runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationInterval {
    /// Closed calendar range; either bound may be open.
    SpecificDate {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    /// Same month/day range every year, wrapping across the new year when
    /// the end precedes the start.
    Annual {
        start_month: u32,
        start_day: u32,
        end_month: u32,
        end_day: u32,
    },
    /// Weekday names, e.g. `["Friday", "saturday"]`.
    Weekly { days: Vec<String> },
}

fn default_item_limit() -> usize {
    50
}

fn default_true() -> bool {
    true
}
