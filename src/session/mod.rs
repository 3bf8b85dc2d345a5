//! Per-session interview state kept in the shared TTL store

pub mod tracker;

pub use tracker::SessionTracker;
