//! linkserve: serve local files over HTTP with correct symbolic link lengths
//! and exact byte-range streaming.
//!
//! The [`files`] module is usable on its own with any `tokio` sink; the
//! remaining modules make up the HTTP server binary.

pub mod config;
pub mod files;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
