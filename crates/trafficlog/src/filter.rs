//! Dataset filtering for the public listing.
//!
//! All supplied predicates must hold. A predicate that is absent, or a search
//! text that is blank, is not applied.

use chrono::NaiveDate;

use crate::classify::TrafficLevel;
use crate::dataset::Dataset;

/// Filter criteria for a dataset listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetFilter {
    /// Case-insensitive substring of the location, matched as given.
    ///
    /// Surrounding whitespace is significant; whitespace-only text is absent.
    pub search_text: Option<String>,
    /// Exact survey date.
    pub date: Option<NaiveDate>,
    /// Exact classification.
    pub classification: Option<TrafficLevel>,
}

impl DatasetFilter {
    /// A filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to locations containing `text`.
    #[must_use]
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Restrict to one survey date.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Restrict to one classification.
    #[must_use]
    pub fn with_classification(mut self, level: TrafficLevel) -> Self {
        self.classification = Some(level);
        self
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.date.is_none() && self.classification.is_none()
    }

    fn needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_lowercase)
    }

    /// Whether `dataset` satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, dataset: &Dataset) -> bool {
        self.matches_with(dataset, self.needle().as_deref())
    }

    fn matches_with(&self, dataset: &Dataset, needle: Option<&str>) -> bool {
        needle.map_or(true, |n| dataset.location.to_lowercase().contains(n))
            && self.date.map_or(true, |d| dataset.date == d)
            && self
                .classification
                .map_or(true, |c| dataset.classification == c)
    }

    /// The datasets that match, in their original order.
    #[must_use]
    pub fn apply(&self, datasets: &[Dataset]) -> Vec<Dataset> {
        let needle = self.needle();
        datasets
            .iter()
            .filter(|d| self.matches_with(d, needle.as_deref()))
            .cloned()
            .collect()
    }
}

/// Sort datasets for display, most recently created first.
pub fn sort_newest_first(datasets: &mut [Dataset]) {
    datasets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
