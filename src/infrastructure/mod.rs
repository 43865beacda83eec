pub mod cancel;
pub mod transport;

pub use cancel::{wait_or_cancel, CancelSignal, CancelSource};
pub use transport::{HttpTransport, ImagePart, RequestBody, Transport, TransportError, TransportResponse};
