//! Application layer for tracechat.
//!
//! Coordinates the domain core and the HTTP infrastructure into chat turns.

pub mod session;

pub use session::{
    ChatController, ControllerFactory, StreamSession, SubmitOutcome, TurnOutcome, TurnPhase,
};
