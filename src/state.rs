use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::checksum::{self, FileReport};
use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{filtered_indices, FilterSelection};
use crate::data::indicators::Indicators;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::geo::Boundaries;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds). Shared read-only.
    pub dataset: Option<Arc<Dataset>>,

    /// File the current dataset came from.
    pub data_source: Option<PathBuf>,

    /// Region outlines for the map, if the boundary file loaded.
    pub boundaries: Option<Boundaries>,

    /// Why the map is unavailable.
    pub boundary_message: Option<String>,

    /// Disease and driver columns available in the dataset.
    pub indicators: Indicators,

    /// Current region/date selection; `None` without a dataset.
    pub selection: Option<FilterSelection>,

    /// Indices of records passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Column plotted in the trend chart and the map.
    pub disease: Option<String>,

    /// Column compared against the disease in the scatter plot.
    pub driver: Option<String>,

    /// Stable colour per region.
    pub region_colors: Option<ColorMap>,

    /// Last load failure, shown in the UI.
    pub load_error: Option<String>,

    /// Result of the last manual checksum run.
    pub checksum_reports: Option<Result<Vec<FileReport>, String>>,

    /// Whether the integrity window is open.
    pub show_integrity: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            data_source: None,
            boundaries: None,
            boundary_message: None,
            indicators: Indicators::default(),
            selection: None,
            visible_indices: Vec::new(),
            disease: None,
            driver: None,
            region_colors: None,
            load_error: None,
            checksum_reports: None,
            show_integrity: false,
        }
    }

    /// One-shot load of a dataset file. On failure the error is kept for
    /// display and any previously loaded dataset stays in place.
    pub fn load_dataset(&mut self, path: &Path) {
        match loader::load_file(path, &self.config.load_options()) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} records from {} with columns {:?}",
                    dataset.len(),
                    path.display(),
                    dataset.columns()
                );
                self.set_dataset(path.to_path_buf(), dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.load_error = Some(format!("Could not load {}: {e}", path.display()));
            }
        }
    }

    /// Ingest a newly loaded dataset, reset the selection and indicators.
    pub fn set_dataset(&mut self, source: PathBuf, dataset: Dataset) {
        let dataset = Arc::new(dataset);

        self.indicators = Indicators::resolve(
            &dataset,
            &self.config.disease_columns,
            &self.config.driver_columns,
        );
        self.disease = self.indicators.diseases.first().cloned();
        self.driver = self.indicators.drivers.first().cloned();
        self.region_colors = Some(ColorMap::new(dataset.regions()));
        self.selection = Some(FilterSelection::all(&dataset));
        self.visible_indices = (0..dataset.len()).collect();

        self.dataset = Some(dataset);
        self.data_source = Some(source);
        self.load_error = None;
    }

    /// Load region outlines; failure only disables the map.
    pub fn load_boundaries(&mut self, path: &Path) {
        match Boundaries::load(path, &self.config.boundary_name_property) {
            Ok(b) => {
                log::info!("Loaded {} region boundaries from {}", b.regions.len(), path.display());
                self.boundaries = Some(b);
                self.boundary_message = None;
            }
            Err(e) => {
                log::warn!("Map disabled: {e}");
                self.boundary_message = Some(e.to_string());
            }
        }
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) {
            self.visible_indices = filtered_indices(ds, sel);
        }
    }

    /// Toggle a single region in the selection.
    pub fn toggle_region(&mut self, region: &str) {
        if let Some(sel) = &mut self.selection {
            if !sel.regions.remove(region) {
                sel.regions.insert(region.to_string());
            }
        }
        self.refilter();
    }

    pub fn select_all_regions(&mut self) {
        if let (Some(ds), Some(sel)) = (&self.dataset, &mut self.selection) {
            sel.regions = ds.regions().clone();
        }
        self.refilter();
    }

    pub fn select_no_regions(&mut self) {
        if let Some(sel) = &mut self.selection {
            sel.regions.clear();
        }
        self.refilter();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if let Some(sel) = &mut self.selection {
            sel.start = start;
            sel.end = end;
        }
        self.refilter();
    }

    pub fn set_disease(&mut self, column: String) {
        self.disease = Some(column);
    }

    pub fn set_driver(&mut self, column: String) {
        self.driver = Some(column);
    }

    /// Manual integrity check of the published files.
    pub fn run_checksums(&mut self) {
        let manifest = self.config.checksum_manifest.clone();
        log::info!("Verifying checksums from {}", manifest.display());
        self.checksum_reports = Some(checksum::verify_manifest(&manifest).map_err(|e| e.to_string()));
        self.show_integrity = true;
    }

    /// Earliest and latest date the date pickers may show. `None` without a
    /// dataset or when it has no records.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.dataset.as_ref().and_then(|ds| ds.date_range())
    }

    pub fn is_region_selected(&self, region: &str) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|s| s.regions.contains(region))
    }
}
