//! Pluggable networking.
//!
//! The consensus engine never performs I/O itself. It talks to the outside world through a
//! user-provided implementation of [`Network`](network::Network), which is expected to be
//! non-blocking and best-effort.

pub mod network;

pub mod messages;

pub(crate) mod receiving;

pub(crate) mod sending;
