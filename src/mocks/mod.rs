//! Mock generators: given an original unit/module/provider and optional stub
//! overrides, synthesize a substitute preserving the original's addressable
//! shape (selector, inputs, outputs, pipe name, token identity) while
//! performing no real logic and recording invocations.

pub mod directive;
pub mod module;
pub mod pipe;
pub mod provider;
