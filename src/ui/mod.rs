/// UI layer: immediate-mode panels built with egui.
pub mod panels;
pub mod plot;
pub mod table;
