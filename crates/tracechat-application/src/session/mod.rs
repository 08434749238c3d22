//! Chat session services.
//!
//! `ChatController` runs turns; each turn's connection lives in a
//! `StreamSession` that is closed on every exit path.

mod controller;
mod factory;
mod stream_session;

pub use controller::{ChatController, SubmitOutcome, TurnOutcome, TurnPhase};
pub use factory::ControllerFactory;
pub use stream_session::{SessionFrame, StreamSession};
