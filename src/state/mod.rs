//! Push-to-talk state machine
//!
//! Tracks held keys and the PTT mode:
//! - Enabled: the mic opens while the PTT key is held
//! - Disabled: PTT gating suspended, mic left as the toggle set it

mod machine;

pub use machine::{Predicates, StateMachine};
