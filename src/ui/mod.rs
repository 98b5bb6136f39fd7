//! egui rendering of the dashboard: filter panel, metrics, and charts.

pub mod panels;
pub mod plot;
