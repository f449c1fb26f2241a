//! Terminal client for the Hubbub real-time delivery server.

pub mod error;
pub mod formatter;
pub mod session;

pub use error::ClientError;
pub use session::{connect, run};
