// src/ui/mod.rs
//
// UI module providing screen-space UI elements.
//
// Current features:
// - Dialogue box (speaker, body with typewriter reveal, annotation, portrait key)
// - Progress counter
// - Advance, area-jump and branch-result input

pub mod dialogue_box;

// Re-export the main plugin
pub use dialogue_box::UiPlugin;
