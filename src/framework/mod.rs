//! The modeled host framework: metadata registry, dynamic values, providers,
//! dependency injection, templates and the miniature renderer.
//!
//! Everything above this module treats these pieces as the host framework's
//! public surface; the mocking engine itself never reaches into renderer
//! internals.

pub mod injector;
pub mod provider;
pub mod registry;
pub mod renderer;
pub mod template;
pub mod value;
