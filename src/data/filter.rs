use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Filter selection: which regions and which dates are shown
// ---------------------------------------------------------------------------

/// Transient UI parameters narrowing which records are rendered.
/// Never mutates the dataset it is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    /// Inclusive lower bound.
    pub start: NaiveDate,
    /// Inclusive upper bound.
    pub end: NaiveDate,
}

impl FilterSelection {
    /// Everything selected: all regions and the dataset's full date range.
    pub fn all(dataset: &Dataset) -> Self {
        let (start, end) = dataset
            .date_range()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            regions: dataset.regions().clone(),
            start,
            end,
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Return indices of records that pass the selection, in dataset order.
///
/// A record passes when:
/// * its region is in the selected set (an empty set hides everything)
/// * its date lies within `[start, end]` (an inverted range hides everything)
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    if selection.regions.is_empty() || selection.start > selection.end {
        return Vec::new();
    }
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            selection.regions.contains(&rec.region) && selection.contains_date(rec.date)
        })
        .map(|(i, _)| i)
        .collect()
}
