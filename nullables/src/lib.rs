//! In-memory stand-ins for the clock and the versioned store.
//!
//! [`NullRemote`] keeps branches in a map and counts accepted and rejected
//! pushes; conflicts can be injected to drive the orchestrator's retry loop.
//! [`NullClock`] only moves when a test moves it.

pub mod clock;
pub mod remote;

pub use clock::NullClock;
pub use remote::NullRemote;
