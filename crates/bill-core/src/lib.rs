//! Core data types for the bill build tool.
//!
//! This crate defines the types that describe a project's declared
//! dependencies and its subproject layout: coordinates, version specs,
//! scopes, visibility categories, and subprojects.
//!
//! This crate is intentionally free of async code and I/O.

pub mod category;
pub mod coordinate;
pub mod dependency;
pub mod subproject;
