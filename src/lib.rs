#![deny(clippy::all)]

/**
 * Shallow Render - shallow-rendering test harness
 *
 * Renders one component with every collaborator replaced by a generated
 * mock, then exposes a query surface over the result.
 */

// The miniature host-framework model the harness runs against.
pub mod framework;

// Core modules
pub mod assembler;
pub mod cache;
mod error;
pub mod graph;
pub mod mocks;
pub mod reflect;
pub mod rendering;
pub mod selector;
pub mod setup;
mod shallow;

// Re-exports
pub use error::{Result, ShallowError};
pub use framework::injector::Injector;
pub use framework::provider::{
    InjectionToken, ModuleImport, ModuleWithProviders, Provide, ProviderEntry, Token,
};
pub use framework::registry::{
    common_module, ComponentDef, DirectiveDef, ModuleDef, PipeDef, PropertyBinding, ServiceDef,
    TypeMeta, TypeRef,
};
pub use framework::renderer::{scheduler_token, DebugElement, Fixture};
pub use framework::value::{Emitter, Func, Obj, Value};
pub use rendering::{QueryMatch, QueryTarget, Rendering};
pub use setup::Stubs;
pub use shallow::{RenderOptions, Shallow};
