//! Nullable collaborators for deterministic testing.
//!
//! Governance consumes its outside world through traits: a signature
//! verifier, a parameter sink, a treasury and an optional execution handler.
//! The types here implement those traits with programmable answers and a
//! record of every call, so tests can drive failure paths without keys,
//! balances or real side effects.

pub mod handler;
pub mod params;
pub mod treasury;
pub mod verifier;

pub use handler::{HandlerLog, ScriptedHandler};
pub use params::RecordingParams;
pub use treasury::RecordingTreasury;
pub use verifier::NullVerifier;
