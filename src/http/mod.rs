//! HTTP protocol layer module
//!
//! Range parsing, content types, body types and response builders, kept
//! apart from the file-sending logic that fills the bodies.

pub mod body;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::parse_range_header;
pub use response::{
    build_404_response, build_405_response, build_413_response, build_416_response,
    build_500_response, build_options_response, build_redirect_response,
};
