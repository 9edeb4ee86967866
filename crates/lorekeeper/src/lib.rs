//! Client library for a tabletop RAG assistant backend.
//!
//! The backend answers prompts about the current scene as a stream of
//! newline-delimited JSON records, each carrying a piece of reply text and/or
//! a list of scene-token highlight hints. This crate owns the pieces the
//! front end drives:
//! - decoding that stream into a growing [`models::message::Message`]
//!   ([`stream`]),
//! - resolving highlight hints against scene tokens and applying the
//!   transient outline emphasis ([`highlight`]),
//! - the HTTP surface of the backend ([`client`]) and the controller that
//!   ties one chat exchange together ([`assistant`]).
//!
//! The hosting application provides the scene graph and the rendering
//! surface; both are modeled here as plain data ([`scene`]) and a trait
//! ([`highlight::Canvas`]) so front ends can plug their own in.

pub mod assistant;
pub mod client;
pub mod errors;
pub mod highlight;
pub mod models;
pub mod scene;
pub mod session;
pub mod settings;
pub mod stream;
