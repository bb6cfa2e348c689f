//! Floating taskbar: a headless engine in [`taskbar`] and the egui host
//! that renders it.

pub mod app;
pub mod branding;
pub mod config;
pub mod events;
pub mod session;
pub mod taskbar;
