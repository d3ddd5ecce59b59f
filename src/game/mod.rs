pub mod clock;
pub mod controller;
pub mod history;
pub mod input;
pub mod notation;
pub mod pgn;
pub mod promotion;
pub mod rules;
pub mod settings;
pub mod utils;

pub use controller::{GameController, GameEvent};
pub use input::{Selection, SelectionOutcome};
