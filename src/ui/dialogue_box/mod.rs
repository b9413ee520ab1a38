// src/ui/dialogue_box/mod.rs
//
// Dialogue box module: bottom-of-screen panel rendering the dialogue view.

pub mod components;
pub mod plugin;
pub mod systems;

pub use plugin::UiPlugin;
