//! API Layer
//!
//! Network access: the transport seam, its HTTP and in-memory
//! implementations, and the collection and auth clients built on it.

mod auth;
mod collection;
mod http;
mod memory;
mod transport;

pub use auth::{AuthClient, Registration};
pub use collection::{HttpCollection, RemoteCollection};
pub use http::ReqwestTransport;
pub use memory::{Failure, MemoryBackend};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
