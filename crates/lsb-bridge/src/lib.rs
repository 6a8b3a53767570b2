//! lsb-bridge
//!
//! Embedding bridge between a host tick loop and the Lua strategy
//! interpreter.
//!
//! Contract:
//! - Exactly one READY session per process; the constructor enforces it and
//!   returns a typed error instead of terminating.
//! - Host functions are registered before the strategy script's top-level
//!   statements run, so scripts may reference them unconditionally.
//! - The decision produced by a tick reflects the last decision-setting host
//!   function called during that tick, or NOOP if none was called.
//! - Every boundary failure surfaces as a `BridgeError`; recovery policy
//!   belongs to the embedding host, not the bridge.

mod error;
mod host;
mod session;
mod table;
mod tick;

pub use error::*;
pub use host::*;
pub use session::*;
pub use table::*;
pub use tick::*;
