//! Aggregations over a filtered view of the dataset.

use std::collections::BTreeMap;

use super::model::Dataset;

/// Per-region statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    /// Number of non-null observations.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Value at the region's most recent date, if non-null.
    pub latest: Option<f64>,
}

/// For each region, the index of its most recent record among `indices`.
/// Later rows win when dates tie.
pub fn latest_per_region(dataset: &Dataset, indices: &[usize]) -> BTreeMap<String, usize> {
    let mut latest: BTreeMap<String, usize> = BTreeMap::new();
    for &i in indices {
        let Some(rec) = dataset.record(i) else {
            continue;
        };
        let newer = latest
            .get(&rec.region)
            .map_or(true, |&j| dataset.records()[j].date <= rec.date);
        if newer {
            latest.insert(rec.region.clone(), i);
        }
    }
    latest
}

/// Count/mean/min/max/latest of `column` per region, sorted by region.
/// Regions with no non-null value are omitted.
pub fn region_summaries(dataset: &Dataset, indices: &[usize], column: &str) -> Vec<RegionSummary> {
    struct Acc {
        count: usize,
        sum: f64,
        min: f64,
        max: f64,
    }

    let mut accs: BTreeMap<&str, Acc> = BTreeMap::new();
    for &i in indices {
        let Some(rec) = dataset.record(i) else {
            continue;
        };
        let Some(v) = rec.number(column) else {
            continue;
        };
        let acc = accs.entry(rec.region.as_str()).or_insert(Acc {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        });
        acc.count += 1;
        acc.sum += v;
        acc.min = acc.min.min(v);
        acc.max = acc.max.max(v);
    }

    let latest = latest_per_region(dataset, indices);

    accs.into_iter()
        .map(|(region, acc)| RegionSummary {
            region: region.to_string(),
            count: acc.count,
            mean: acc.sum / acc.count as f64,
            min: acc.min,
            max: acc.max,
            latest: latest
                .get(region)
                .and_then(|&i| dataset.record(i))
                .and_then(|r| r.number(column)),
        })
        .collect()
}

/// Pearson correlation between two numeric columns over rows where both are
/// present. `None` with fewer than two pairs or when either column is
/// constant up to rounding, judged relative to the magnitude of its values.
pub fn pearson(dataset: &Dataset, indices: &[usize], x_column: &str, y_column: &str) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = indices
        .iter()
        .filter_map(|&i| dataset.record(i))
        .filter_map(|r| Some((r.number(x_column)?, r.number(y_column)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    let (mut sq_x, mut sq_y) = (0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
        sq_x += x * x;
        sq_y += y * y;
    }
    if var_x <= f64::EPSILON * sq_x || var_y <= f64::EPSILON * sq_y {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, record, sample_dataset};

    fn all(ds: &Dataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn latest_picks_most_recent_date() {
        let ds = sample_dataset();
        let latest = latest_per_region(&ds, &all(&ds));
        assert_eq!(latest["Ashanti"], 2);
        assert_eq!(latest["Volta"], 3);
        assert_eq!(latest["Northern"], 4);
    }

    #[test]
    fn latest_respects_the_filtered_view() {
        let ds = sample_dataset();
        let latest = latest_per_region(&ds, &[0, 1]);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["Ashanti"], 0);
    }

    #[test]
    fn summaries_skip_nulls() {
        let ds = sample_dataset();
        let rows = region_summaries(&ds, &all(&ds), "hiv_incidence");
        assert_eq!(rows.len(), 3);

        let ashanti = &rows[0];
        assert_eq!(ashanti.region, "Ashanti");
        assert_eq!(ashanti.count, 2);
        assert!((ashanti.mean - 1.5).abs() < 1e-12);
        assert_eq!((ashanti.min, ashanti.max), (1.0, 2.0));
        assert_eq!(ashanti.latest, Some(2.0));

        let volta = &rows[2];
        assert_eq!(volta.count, 1);
        // Volta's latest row has a null value.
        assert_eq!(volta.latest, None);
    }

    #[test]
    fn unknown_column_has_no_summary() {
        let ds = sample_dataset();
        assert!(region_summaries(&ds, &all(&ds), "dengue").is_empty());
    }

    #[test]
    fn pearson_of_linear_relation() {
        let ds = sample_dataset();
        // hiv/urbanization pairs: (1.0,0.4) (3.0,0.2) (2.0,0.5) (5.0,0.1)
        let r = pearson(&ds, &all(&ds), "urbanization_level", "hiv_incidence").unwrap();
        assert!(r < -0.8 && r >= -1.0, "r = {r}");

        let same = pearson(&ds, &all(&ds), "hiv_incidence", "hiv_incidence").unwrap();
        assert!((same - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_needs_two_pairs() {
        let ds = sample_dataset();
        assert_eq!(pearson(&ds, &[0], "urbanization_level", "hiv_incidence"), None);
    }

    fn scaled(factor: f64, urban: [f64; 4]) -> Dataset {
        let columns = vec!["hiv_incidence".to_string(), "urbanization_level".to_string()];
        let hiv = [1.0, 3.0, 2.0, 5.0];
        let records = hiv
            .iter()
            .zip(urban)
            .enumerate()
            .map(|(i, (&h, u))| record("Oti", date(2020 + i as i32, 1, 1), Some(h * factor), u * factor))
            .collect();
        Dataset::from_records(columns, records)
    }

    #[test]
    fn pearson_is_scale_free() {
        let urban = [0.4, 0.2, 0.5, 0.1];
        let unit = scaled(1.0, urban);
        let tiny = scaled(1e-9, urban);
        let a = pearson(&unit, &all(&unit), "urbanization_level", "hiv_incidence").unwrap();
        let b = pearson(&tiny, &all(&tiny), "urbanization_level", "hiv_incidence").unwrap();
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }

    #[test]
    fn pearson_of_constant_column_is_none() {
        let ds = scaled(1.0, [0.1; 4]);
        assert_eq!(pearson(&ds, &all(&ds), "urbanization_level", "hiv_incidence"), None);
    }
}
