//! Display ordering over a cache snapshot.

use std::{cmp::Ordering, fmt, str::FromStr};

use icu_collator::{Collator, CollatorOptions, Strength};
use shared::domain::Summary;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    OriginalFileName,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click transition: same field flips direction, a new field starts ascending.
    pub fn select(self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.direction.toggled())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::new(SortField::CreatedAt, SortDirection::Desc)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::OriginalFileName => f.write_str("name"),
            SortField::CreatedAt => f.write_str("created"),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "originalfilename" | "original_file_name" => Ok(SortField::OriginalFileName),
            "created" | "createdat" | "created_at" | "date" => Ok(SortField::CreatedAt),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Accepts `field` or `field:direction`, e.g. `name:asc`.
impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, direction)) => Ok(Self::new(field.parse()?, direction.parse()?)),
            None => Ok(Self::new(s.parse()?, SortDirection::Asc)),
        }
    }
}

/// Returns a new, stably sorted vector. The input is left untouched.
pub fn sort_summaries(summaries: &[Summary], order: SortOrder) -> Vec<Summary> {
    let mut sorted = summaries.to_vec();
    match order.field {
        SortField::CreatedAt => {
            sorted.sort_by(|a, b| directed(a.created_at.cmp(&b.created_at), order.direction))
        }
        SortField::OriginalFileName => {
            let names = NameCollator::new();
            sorted.sort_by(|a, b| {
                directed(names.compare(name_of(a), name_of(b)), order.direction)
            });
        }
    }
    sorted
}

/// Root-locale collation at secondary strength: accents are significant, case is not.
enum NameCollator {
    Icu(Collator),
    /// Used only if collation data cannot be loaded.
    Lowercase,
}

impl NameCollator {
    fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);
        match Collator::try_new(&Default::default(), options) {
            Ok(collator) => NameCollator::Icu(collator),
            Err(error) => {
                warn!(%error, "sort: collator unavailable; comparing lowercased names");
                NameCollator::Lowercase
            }
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            NameCollator::Icu(collator) => collator.compare(a, b),
            NameCollator::Lowercase => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

fn name_of(summary: &Summary) -> &str {
    summary.original_file_name.as_deref().unwrap_or_default()
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
