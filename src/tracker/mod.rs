//! Connection tracking for live traffic.
//! Frames are classified into directional flow keys, optionally filtered by address,
//! and run through a per-protocol state machine that reports each new connection once.
pub mod utils;
pub mod containers;
pub mod classify;
pub mod filter;
pub mod core;
pub mod pipeline;
pub mod capture;
