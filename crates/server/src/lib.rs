//! Gambit Server - Session coordinator for two-seat rooms.
//!
//! Pairs exactly two remote participants into a live room and relays
//! opaque application events (moves, chat) between them until the
//! session ends. What the events mean is the clients' business: move
//! legality, rendering, and any single-player engine live entirely on
//! the client side.

pub mod api;
pub mod config;
pub mod rooms;
