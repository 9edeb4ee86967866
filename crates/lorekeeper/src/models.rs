//! The objects passed between the front end, the backend client, and the
//! entity resolver.
//!
//! The wire formats involved (the chat request body, the stream records, the
//! scene context projection) are all close relatives of these structs but are
//! kept separate where they differ; conversion happens at the boundary that
//! owns the format.

pub mod message;
pub mod role;
