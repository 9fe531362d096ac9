//! Request handler module
//!
//! Routes requests to files on disk and hands them to the file responders.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
