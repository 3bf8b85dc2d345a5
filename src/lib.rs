//! Session state engine for AI-driven mock interviews
//!
//! - [`store`]: TTL key-value store for per-session sets and counters, with a
//!   min-heap expiry schedule and a background reaper
//! - [`interview`]: question generation with duplicate detection and forced
//!   termination
//! - [`session`]: per-session bookkeeping on top of the store
//! - [`providers`]: OpenAI-compatible chat completion client
//! - [`config`]: layered configuration (file, environment, CLI)

pub mod config;
pub mod interview;
pub mod providers;
pub mod session;
pub mod store;
