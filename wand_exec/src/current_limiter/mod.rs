//! Current limiter module
//!
//! The wand motors can carry their peak current only for a short time before they overheat. The
//! limiter lets each joint draw up to its peak current for a limited period, after which the
//! current is held to the sustained limit until the motor has cooled down.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
