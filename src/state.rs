use std::collections::BTreeSet;

use crate::analysis::{remove_continuum, ContinuumAnchor, ContinuumRun, EndpointPair};
use crate::color::ColorMap;
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::model::{MetadataValue, SpectralDataset};

// ---------------------------------------------------------------------------
// Finished run
// ---------------------------------------------------------------------------

/// A completed continuum-removal run together with the snapshot it was
/// computed from. The engine output refers to curves by position, so the
/// dataset indices and the shared axis are kept alongside it; later filter
/// changes do not disturb a finished run.
#[derive(Debug, Clone)]
pub struct FinishedRun {
    /// Dataset indices of the curves fed to the engine, in engine order.
    pub curve_indices: Vec<usize>,
    /// The shared wavelength axis used for the run.
    pub axis: Vec<f64>,
    /// Continuum-removed curves and the band-metrics table.
    pub output: ContinuumRun,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<SpectralDataset>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of spectra passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which metadata column is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether plot clicks currently add continuum anchors.
    pub picking_points: bool,

    /// Clicked shoulder points, in click order. Consecutive clicks pair up.
    pub anchors: Vec<ContinuumAnchor>,

    /// Output of the most recent run, if any.
    pub run: Option<FinishedRun>,

    /// Show the raw curves.
    pub show_raw: bool,
    /// Show the continuum-removed curves.
    pub show_removed: bool,
    /// Show the picked anchors and their connecting lines.
    pub show_picks: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            color_column: None,
            color_map: None,
            status_message: None,
            picking_points: false,
            anchors: Vec::new(),
            run: None,
            show_raw: true,
            show_removed: true,
            show_picks: true,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and colour, and
    /// discard any picks and results from the previous dataset.
    pub fn set_dataset(&mut self, dataset: SpectralDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();

        // Default colour column: first metadata column (if any).
        self.color_column = dataset.column_names.first().cloned();
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.status_message = None;
        self.picking_points = false;
        self.anchors.clear();
        self.run = None;
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &SpectralDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = &self.dataset {
            let ds_clone = ds.clone();
            self.rebuild_color_map(&ds_clone);
        }
    }

    /// Toggle a single metadata value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &MetadataValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    // -- Continuum tool --------------------------------------------------

    /// Arm point picking, discarding any previous picks.
    pub fn start_picking(&mut self) {
        self.picking_points = true;
        self.anchors.clear();
        self.show_picks = true;
    }

    /// Record one clicked shoulder point.
    pub fn push_anchor(&mut self, anchor: ContinuumAnchor) {
        self.anchors.push(anchor);
    }

    /// Drop all picked points.
    pub fn clear_picks(&mut self) {
        self.anchors.clear();
    }

    /// Remove one completed pair (both of its anchors) by pair index.
    pub fn remove_pair(&mut self, pair_index: usize) {
        let start = pair_index * 2;
        if start + 1 < self.anchors.len() {
            self.anchors.drain(start..start + 2);
        }
    }

    /// The picked points grouped into endpoint pairs, click order preserved.
    pub fn pairs(&self) -> Vec<EndpointPair> {
        EndpointPair::pair_up(&self.anchors)
    }

    /// Run continuum removal over the visible curves.
    ///
    /// The shared axis is the first visible spectrum's wavelength grid; the
    /// engine truncates every curve against it. Everything the engine sees
    /// is a snapshot, so filter or pick changes after the run leave the
    /// finished result untouched.
    pub fn run_tool(&mut self) {
        self.picking_points = false;

        let Some(ds) = &self.dataset else {
            self.status_message = Some("Load a dataset before running the tool.".to_string());
            return;
        };

        let axis: Vec<f64> = self
            .visible_indices
            .first()
            .map(|&i| ds.spectra[i].wavelength.clone())
            .unwrap_or_default();
        let curves: Vec<&[f64]> = self
            .visible_indices
            .iter()
            .map(|&i| ds.spectra[i].reflectance.as_slice())
            .collect();
        let pairs = self.pairs();

        match remove_continuum(&axis, &curves, &pairs) {
            Ok(output) => {
                log::info!(
                    "Continuum removal: {} curves, {} pairs, {} metric rows",
                    output.removed.len(),
                    pairs.len(),
                    output.rows.len()
                );
                self.run = Some(FinishedRun {
                    curve_indices: self.visible_indices.clone(),
                    axis,
                    output,
                });
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Continuum removal refused: {e}");
                self.status_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Spectrum;
    use std::collections::BTreeMap;

    fn dataset() -> SpectralDataset {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "sample".to_string(),
            MetadataValue::String("olivine".to_string()),
        );
        SpectralDataset::from_spectra(vec![Spectrum {
            wavelength: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            reflectance: vec![1.0, 0.8, 0.5, 0.8, 1.0],
            metadata,
        }])
    }

    #[test]
    fn run_tool_without_dataset_sets_status() {
        let mut state = AppState::default();
        state.run_tool();
        assert!(state.run.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn run_tool_with_no_visible_curves_reports_precondition() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.select_none("sample");
        state.run_tool();
        assert!(state.run.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn run_tool_produces_rows_for_picked_pair() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.start_picking();
        state.push_anchor(ContinuumAnchor::new(0.0, 1.0));
        state.push_anchor(ContinuumAnchor::new(4.0, 1.0));
        state.run_tool();

        let run = state.run.expect("run should succeed");
        assert_eq!(run.curve_indices, vec![0]);
        assert_eq!(run.output.rows.len(), 1);
        assert!((run.output.rows[0].band_depth - 0.5).abs() < 1e-12);
        assert!(!state.picking_points);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn loading_a_dataset_discards_previous_run_and_picks() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.push_anchor(ContinuumAnchor::new(0.0, 1.0));
        state.push_anchor(ContinuumAnchor::new(4.0, 1.0));
        state.run_tool();
        assert!(state.run.is_some());

        state.set_dataset(dataset());
        assert!(state.run.is_none());
        assert!(state.anchors.is_empty());
    }

    #[test]
    fn remove_pair_drops_both_anchors() {
        let mut state = AppState::default();
        state.push_anchor(ContinuumAnchor::new(0.0, 1.0));
        state.push_anchor(ContinuumAnchor::new(1.0, 0.9));
        state.push_anchor(ContinuumAnchor::new(2.0, 0.8));
        state.push_anchor(ContinuumAnchor::new(3.0, 0.7));
        state.remove_pair(0);
        assert_eq!(state.anchors.len(), 2);
        assert_eq!(state.anchors[0].x, 2.0);
    }
}
