//! Intuition Redis State Store
//!
//! Async Redis persistence for trigger node static data, shared between
//! processes polling the same nodes.

pub mod client;
pub mod store;

pub use client::{connect, RedisError, RedisPool, RedisResult};
pub use store::RedisStateStore;
