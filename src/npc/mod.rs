//! NPCs: generated small-talk pools and entities that trigger dialogue.
pub mod components;
pub mod events;
pub mod lines;
pub mod plugin;
pub mod systems;

pub use plugin::NpcPlugin;
