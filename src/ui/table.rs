use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Column headers, in the export contract's order.
const HEADERS: [&str; 9] = [
    "band fwhm",
    "band min",
    "band centre",
    "band depth",
    "band area",
    "x min",
    "x max",
    "y min",
    "y max",
];

// ---------------------------------------------------------------------------
// Band metrics table (bottom panel)
// ---------------------------------------------------------------------------

/// Render the band-metrics results table for the last run.
pub fn metrics_table(ui: &mut Ui, state: &AppState) {
    let Some(run) = &state.run else {
        return;
    };
    let rows = &run.output.rows;

    ui.strong(format!("Band metrics ({} rows)", rows.len()));

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::remainder().resizable(true), HEADERS.len())
        .header(20.0, |mut header| {
            for title in HEADERS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in rows {
                let cells = [
                    row.band_fwhm,
                    row.band_min,
                    row.band_centre,
                    row.band_depth,
                    row.band_area,
                    row.x_min,
                    row.x_max,
                    row.y_min,
                    row.y_max,
                ];
                body.row(18.0, |mut table_row| {
                    for value in cells {
                        table_row.col(|ui| {
                            ui.label(format!("{value:.4}"));
                        });
                    }
                });
            }
        });
}
