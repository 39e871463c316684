use eframe::egui::{Color32, Ui};
use egui_plot::{Line, LineStyle, MarkerShape, Plot, PlotBounds, PlotPoints, Points};

use crate::analysis::ContinuumAnchor;
use crate::data::model::SpectralDataset;
use crate::state::AppState;

// Don't snap until a sample is within this squared normalized radius.
const SNAP_THRESHOLD: f64 = 0.0025;

// ---------------------------------------------------------------------------
// Spectral plot (central panel)
// ---------------------------------------------------------------------------

/// Render the spectral plot: raw curves, continuum-removed overlays, picked
/// anchors, and (while picking is armed) click handling with snap-to-sample.
pub fn spectral_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view spectra  (File → Open…)");
        });
        return;
    };

    let mut clicked: Option<ContinuumAnchor> = None;

    {
        let color_map = &state.color_map;
        let color_col = state.color_column.as_deref();

        Plot::new("spectral_plot")
            .legend(egui_plot::Legend::default())
            .x_axis_label("Wavelength")
            .y_axis_label("Reflectance")
            .allow_boxed_zoom(!state.picking_points)
            .allow_drag(!state.picking_points)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                // ---- Raw curves ----
                if state.show_raw {
                    for &idx in &state.visible_indices {
                        let sp = &dataset.spectra[idx];

                        // Determine colour from the colour-by column.
                        let color = color_col
                            .and_then(|col| {
                                let val = sp.metadata.get(col)?;
                                let cm = color_map.as_ref()?;
                                Some(cm.color_for(val))
                            })
                            .unwrap_or(Color32::LIGHT_BLUE);

                        // Build the legend name from the colour column value.
                        let name = color_col
                            .and_then(|col| sp.metadata.get(col))
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| format!("spectrum {idx}"));

                        let points: PlotPoints = sp
                            .wavelength
                            .iter()
                            .zip(&sp.reflectance)
                            .map(|(&xi, &yi)| [xi, yi])
                            .collect();

                        plot_ui.line(Line::new(points).name(&name).color(color).width(1.5));
                    }
                }

                // ---- Continuum-removed curves ----
                if state.show_removed {
                    if let Some(run) = &state.run {
                        for (k, &idx) in run.curve_indices.iter().enumerate() {
                            let curve = &run.output.removed[k];
                            let axis = &run.axis[..curve.len().min(run.axis.len())];
                            let meta = color_col
                                .and_then(|col| dataset.spectra[idx].metadata.get(col));

                            let color = meta
                                .and_then(|val| color_map.as_ref().map(|cm| cm.color_for(val)))
                                .unwrap_or(Color32::LIGHT_BLUE);
                            let name = meta
                                .map(|v| format!("{v} (removed)"))
                                .unwrap_or_else(|| format!("spectrum {idx} (removed)"));

                            let points: PlotPoints = axis
                                .iter()
                                .zip(curve)
                                .map(|(&xi, &yi)| [xi, yi])
                                .collect();

                            plot_ui.line(
                                Line::new(points)
                                    .name(&name)
                                    .color(color)
                                    .width(1.0)
                                    .style(LineStyle::dotted_dense()),
                            );
                        }
                    }
                }

                // ---- Picked anchors and pair lines ----
                if state.show_picks && !state.anchors.is_empty() {
                    let markers: Vec<[f64; 2]> =
                        state.anchors.iter().map(|a| [a.x, a.y]).collect();
                    plot_ui.points(
                        Points::new(markers)
                            .shape(MarkerShape::Circle)
                            .radius(4.0)
                            .color(Color32::RED),
                    );

                    for pair in state.pairs() {
                        let segment =
                            vec![[pair.start.x, pair.start.y], [pair.end.x, pair.end.y]];
                        plot_ui.line(
                            Line::new(segment)
                                .color(Color32::RED)
                                .style(LineStyle::dashed_loose()),
                        );
                    }
                }

                // ---- Pick interaction ----
                if state.picking_points {
                    if let Some(pointer) = plot_ui.pointer_coordinate() {
                        let snapped = nearest_sample(
                            dataset,
                            &state.visible_indices,
                            plot_ui.plot_bounds(),
                            pointer.x,
                            pointer.y,
                        );

                        // Preview marker, plus a rubber-band line from an
                        // unpaired anchor to the cursor.
                        plot_ui.points(
                            Points::new(vec![[snapped.x, snapped.y]])
                                .shape(MarkerShape::Diamond)
                                .radius(4.0)
                                .color(Color32::YELLOW),
                        );
                        if state.anchors.len() % 2 == 1 {
                            if let Some(pending) = state.anchors.last() {
                                plot_ui.line(
                                    Line::new(vec![
                                        [pending.x, pending.y],
                                        [snapped.x, snapped.y],
                                    ])
                                    .color(Color32::YELLOW)
                                    .style(LineStyle::dashed_dense()),
                                );
                            }
                        }

                        if plot_ui.response().clicked() {
                            clicked = Some(snapped);
                        }
                    }
                }
            });
    }

    if let Some(anchor) = clicked {
        state.push_anchor(anchor);
    }
}

// ---------------------------------------------------------------------------
// Snap-to-sample
// ---------------------------------------------------------------------------

/// Find the visible data sample nearest to the cursor, measured in
/// plot-normalized coordinates so the snap radius is isotropic on screen.
/// Falls back to the raw cursor position when nothing is close enough.
fn nearest_sample(
    dataset: &SpectralDataset,
    visible: &[usize],
    bounds: PlotBounds,
    x_pt: f64,
    y_pt: f64,
) -> ContinuumAnchor {
    let span_x = bounds.max()[0] - bounds.min()[0];
    let span_y = bounds.max()[1] - bounds.min()[1];
    if span_x <= 0.0 || span_y <= 0.0 {
        return ContinuumAnchor::new(x_pt, y_pt);
    }

    let px = (x_pt - bounds.min()[0]) / span_x;
    let py = (y_pt - bounds.min()[1]) / span_y;

    let mut best: Option<(f64, f64, f64)> = None; // (radius², x, y)
    for &idx in visible {
        let sp = &dataset.spectra[idx];
        let length = sp.wavelength.len().min(sp.reflectance.len());
        for i in 0..length {
            let nx = (sp.wavelength[i] - bounds.min()[0]) / span_x;
            let ny = (sp.reflectance[i] - bounds.min()[1]) / span_y;
            let dx = nx - px;
            let dy = ny - py;
            let radius = dx * dx + dy * dy;
            if radius < SNAP_THRESHOLD && best.map_or(true, |(r, _, _)| radius < r) {
                best = Some((radius, sp.wavelength[i], sp.reflectance[i]));
            }
        }
    }

    best.map(|(_, x, y)| ContinuumAnchor::new(x, y))
        .unwrap_or(ContinuumAnchor::new(x_pt, y_pt))
}
