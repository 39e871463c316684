use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::analysis::report::write_csv;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filters and continuum picks
// ---------------------------------------------------------------------------

/// Render the left panel: colour-by selector, metadata filters, and the
/// list of picked continuum point pairs.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Curves");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.column_names.clone();
    let unique = dataset.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color_col = state.color_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(&current_color_col)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui
                            .selectable_label(current_color_col == *col, col)
                            .clicked()
                        {
                            state.set_color_column(col.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Per-column filter widgets (collapsible) ----
            for col in &columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let selected = state.filters.entry(col.clone()).or_default();

                // Show count of selected / total in the header
                let n_selected = selected.len();
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        // Select all / none buttons
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        // Re-borrow after potential mutation from All/None
                        let selected = state.filters.entry(col.clone()).or_default();

                        for val in all_values {
                            let is_selected = selected.contains(val);
                            let label = val.to_string();

                            // Show colour swatch if this is the colour column
                            let mut text = RichText::new(&label);
                            if state.color_column.as_deref() == Some(col) {
                                if let Some(cm) = &state.color_map {
                                    let c = cm.color_for(val);
                                    text = text.color(c);
                                }
                            }

                            let mut checked = is_selected;
                            if ui.checkbox(&mut checked, text).changed() {
                                if checked {
                                    selected.insert(val.clone());
                                } else {
                                    selected.remove(val);
                                }
                            }
                        }
                    });
            }

            ui.separator();
            continuum_picks(ui, state);
        });

    // Recompute visible indices after any checkbox changes.
    state.refilter();
}

/// The picked shoulder-point pairs, one row per pair with a delete button.
fn continuum_picks(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Continuum picks");

    if state.anchors.is_empty() {
        ui.label("No points picked.");
        ui.label("Tools → Pick continuum points, then click pairs of shoulder points on the plot.");
        return;
    }

    let pairs = state.pairs();
    let mut remove: Option<usize> = None;
    for (i, pair) in pairs.iter().enumerate() {
        let ordered = pair.ordered();
        ui.horizontal(|ui: &mut Ui| {
            if ui.small_button("✕").clicked() {
                remove = Some(i);
            }
            ui.label(format!(
                "pair {}: x [{:.2}, {:.2}]",
                i + 1,
                ordered.start.x,
                ordered.end.x
            ));
        });
    }
    if let Some(i) = remove {
        state.remove_pair(i);
    }

    if state.anchors.len() % 2 == 1 {
        let pending = state.anchors[state.anchors.len() - 1];
        ui.label(format!("pending: ({:.2}, {:.2})", pending.x, pending.y));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_rows = state
                .run
                .as_ref()
                .is_some_and(|r| !r.output.rows.is_empty());
            if ui
                .add_enabled(has_rows, egui::Button::new("Export metrics…"))
                .clicked()
            {
                export_metrics_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Tools", |ui: &mut Ui| {
            if ui.button("Pick continuum points").clicked() {
                state.start_picking();
                ui.close_menu();
            }
            if ui.button("Run continuum removal").clicked() {
                state.run_tool();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Clear picks").clicked() {
                state.clear_picks();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} spectra loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        if ui.selectable_label(state.show_raw, "Raw").clicked() {
            state.show_raw = !state.show_raw;
        }
        if ui.selectable_label(state.show_removed, "Removed").clicked() {
            state.show_removed = !state.show_removed;
        }
        if ui.selectable_label(state.show_picks, "Picks").clicked() {
            state.show_picks = !state.show_picks;
        }

        if state.picking_points {
            ui.label(
                RichText::new("picking: click pairs of shoulder points").color(Color32::YELLOW),
            );
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spectral data")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Text", &["txt"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} spectra with columns {:?}",
                    dataset.len(),
                    dataset.column_names
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn export_metrics_dialog(state: &mut AppState) {
    let rows = match &state.run {
        Some(run) => run.output.rows.clone(),
        None => return,
    };

    let file = rfd::FileDialog::new()
        .set_title("Export band metrics")
        .set_file_name("band_metrics.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        let result = std::fs::File::create(&path)
            .map_err(anyhow::Error::from)
            .and_then(|f| write_csv(f, &rows));
        match result {
            Ok(()) => {
                log::info!("Exported {} metric rows to {}", rows.len(), path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export metrics: {e:#}");
                state.status_message = Some(format!("Export failed: {e:#}"));
            }
        }
    }
}
