pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{InputEvent, MarkerEvent};
pub use handler::{hit_test, Action, InteractionRouter};
