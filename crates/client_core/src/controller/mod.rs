//! Controller layer: dashboard events, error modeling, and reducer-style state transitions.

pub mod events;
pub mod reducer;
