//! Client-side filtering of a loaded list.
//!
//! Criteria combine with logical AND. Free-text search matches when any of the
//! record's searchable fields contains the term, ignoring case. Category filters
//! match by exact equality unless the selection is [`Selection::All`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sentinel value that disables a category filter.
pub const ALL: &str = "all";

/// Field access used by search, category filters and sorting.
pub trait Searchable {
    /// String fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a named field, used for category filters and sort keys.
    fn field(&self, key: &str) -> Option<String>;
}

/// State of one category selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Exact(String),
}

impl Selection {
    /// `"all"` (any case) and the empty string mean no filtering.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
            Self::All
        } else {
            Self::Exact(trimmed.to_string())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Exact(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub categories: BTreeMap<String, Selection>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, key: impl Into<String>, value: &str) -> Self {
        self.categories.insert(key.into(), Selection::parse(value));
        self
    }

    /// True when every record passes.
    pub fn is_identity(&self) -> bool {
        self.search.trim().is_empty()
            && self.categories.values().all(|s| *s == Selection::All)
    }

    /// Active category filters as query parameters for the backend.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.categories
            .iter()
            .filter_map(|(key, selection)| match selection {
                Selection::All => None,
                Selection::Exact(value) => Some((key.clone(), value.clone())),
            })
            .collect()
    }

    pub fn matches<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty()
            && !record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        {
            return false;
        }

        self.categories
            .iter()
            .all(|(key, selection)| selection.matches(record.field(key).as_deref()))
    }
}

/// Keeps the records matching `criteria`, in their original order.
pub fn apply_filter<T: Searchable + Clone>(records: &[T], criteria: &FilterCriteria) -> Vec<T> {
    records
        .iter()
        .filter(|record| criteria.matches(*record))
        .cloned()
        .collect()
}

/// Distinct values of `key` across the list, sorted, for populating a selector.
pub fn filter_options<T: Searchable>(records: &[T], key: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.field(key))
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        status: &'static str,
    }

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name]
        }

        fn field(&self, key: &str) -> Option<String> {
            match key {
                "statut" => Some(self.status.to_string()),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Mariam Koné", status: "actif" },
            Row { name: "Ibrahim Sow", status: "inactif" },
            Row { name: "KONATE Ali", status: "actif" },
        ]
    }

    #[test]
    fn all_sentinel_matches_everything() {
        assert_eq!(Selection::parse("ALL"), Selection::All);
        assert_eq!(Selection::parse(""), Selection::All);
        let criteria = FilterCriteria::new().with_category("statut", "all");
        assert!(criteria.is_identity());
        assert_eq!(apply_filter(&rows(), &criteria), rows());
    }

    #[test]
    fn search_is_case_insensitive() {
        let criteria = FilterCriteria::new().with_search("kon");
        let names: Vec<_> = apply_filter(&rows(), &criteria)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Mariam Koné", "KONATE Ali"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let criteria = FilterCriteria::new()
            .with_search("i")
            .with_category("statut", "inactif");
        let filtered = apply_filter(&rows(), &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Ibrahim Sow");
    }

    #[test]
    fn unknown_category_key_matches_nothing() {
        let criteria = FilterCriteria::new().with_category("vague", "V1");
        assert!(apply_filter(&rows(), &criteria).is_empty());
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        assert_eq!(filter_options(&rows(), "statut"), vec!["actif", "inactif"]);
    }

    #[test]
    fn query_pairs_skip_all() {
        let criteria = FilterCriteria::new()
            .with_category("statut", "generee")
            .with_category("filiere", "all");
        assert_eq!(
            criteria.query_pairs(),
            vec![("statut".to_string(), "generee".to_string())]
        );
    }
}
