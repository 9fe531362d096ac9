//! Response body helpers
//!
//! All responses share one boxed body type so that fixed messages and
//! streamed file contents can be returned from the same handler.

use crate::files::BUFFER_SIZE;
use futures_util::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Body type of every response produced by this server
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// In-memory body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Zero-length body
pub fn empty() -> ResponseBody {
    full(Bytes::new())
}

/// Body that yields whatever is read from `reader` until EOF
pub fn streaming<R>(reader: R) -> ResponseBody
where
    R: AsyncRead + Send + Sync + 'static,
{
    let frames = ReaderStream::with_capacity(reader, BUFFER_SIZE).map_ok(Frame::data);
    StreamBody::new(frames).boxed()
}
