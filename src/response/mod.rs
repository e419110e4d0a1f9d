//! The response envelope and content-type classifier (§3, §4.2).

pub mod classify;
pub mod envelope;

pub use classify::{classify, ContentType};
pub use envelope::ResponseEnvelope;
