#![forbid(unsafe_code)]

//! # Ynance-TUI
//! Terminal front end of the Ynance dashboard. [`app::App`] owns all dashboard state and turns
//! key presses into [`app::Command`]s, [`runtime::Runtime`] executes them against
//! `ynance-data`, and [`ui`] renders a frame from the current state.

pub mod app;
pub mod logging;
pub mod runtime;
pub mod ui;
