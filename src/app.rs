use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ContinuumLabApp {
    pub state: AppState,
}

impl eframe::App for ContinuumLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and picks ----
        egui::SidePanel::left("curve_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: band metrics from the last run ----
        let has_rows = self
            .state
            .run
            .as_ref()
            .is_some_and(|r| !r.output.rows.is_empty());
        if has_rows {
            egui::TopBottomPanel::bottom("metrics_panel")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| {
                    table::metrics_table(ui, &self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectral_plot(ui, &mut self.state);
        });
    }
}
