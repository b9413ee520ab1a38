//! Dialogue sequencing: authored sequences, line playback, gating, and chaining.
//!
//! The core (`types` through `manager`) is plain Rust and runs without an
//! `App`; `plugin`, `systems`, and `events` bind it to Bevy.
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod events;
pub mod history;
pub mod manager;
pub mod placeholders;
pub mod player;
pub mod plugin;
pub mod providers;
pub mod store;
pub mod systems;
pub mod types;
pub mod typewriter;
pub mod view;

pub use plugin::DialoguePlugin;
