//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Request and file transfer logging
//! - Error and warning logging
//! - File-based logging support

pub mod writer;

pub use writer::Level;

use crate::config::Config;
use chrono::Local;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = Level::parse(&config.logging.level).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Unknown log level '{}'", config.logging.level),
        )
    })?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Info and warning lines are dropped below the configured level
fn enabled(level: Level) -> bool {
    !writer::is_initialized() || writer::get().enabled(level)
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Write to info log
fn write_info(message: &str) {
    if !enabled(Level::Info) {
        return;
    }
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    let line = format!("{} {message}", timestamp());
    if writer::is_initialized() {
        writer::get().write_error(&line);
    } else {
        eprintln!("{line}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    let line = format!("{} {message}", timestamp());
    if writer::is_initialized() {
        writer::get().write_access(&line);
    } else {
        println!("{line}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("File server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info(&format!(
        "Symbolic links: {}",
        if config.files.follow_symlinks {
            "read target length directly"
        } else {
            "served like ordinary files"
        }
    ));
    for (prefix, handler) in &config.routes.custom_routes {
        write_info(&format!("Route: {prefix} -> {handler:?}"));
    }
    write_info("======================================\n");
}

pub fn log_shutdown() {
    write_info("[Shutdown] Stopping listener and cancelling transfers");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_access(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    write_access(&format!("[Request] {method} {uri} {version:?}"));
}

pub fn log_file_response(status: u16, path: &Path, bytes: u64) {
    write_access(&format!(
        "[Response] {status} {} ({bytes} bytes)",
        path.display()
    ));
}

pub fn log_transfer_complete(path: &Path, bytes: u64) {
    write_access(&format!(
        "[Transfer] {} complete ({bytes} bytes)",
        path.display()
    ));
}

pub fn log_transfer_failed(path: &Path, err: &impl std::fmt::Display) {
    write_error(&format!("[Transfer] {} aborted: {err}", path.display()));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}
