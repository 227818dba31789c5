//! Pure reads over the metadata table.
//!
//! All list-valued fields come back as (possibly empty) vectors, never as an
//! absent value, so callers can iterate without guarding.

use crate::error::{Result, ShallowError};
use crate::framework::provider::{ModuleImport, ProviderEntry};
use crate::framework::registry::{PropertyBinding, TypeMeta, TypeRef};

/// Resolved view of a component or directive.
#[derive(Clone, Default)]
pub struct DirectiveReflection {
    pub selector: Option<String>,
    pub inputs: Vec<PropertyBinding>,
    pub outputs: Vec<PropertyBinding>,
    pub template: Option<String>,
    pub providers: Vec<ProviderEntry>,
    pub export_as: Option<String>,
    pub structural: bool,
}

/// Resolved view of a module.
#[derive(Clone, Default)]
pub struct ModuleReflection {
    pub imports: Vec<ModuleImport>,
    pub declarations: Vec<TypeRef>,
    pub providers: Vec<ProviderEntry>,
    pub exports: Vec<TypeRef>,
    pub entry_components: Vec<TypeRef>,
    pub schemas: Vec<String>,
}

pub struct Reflector;

impl Reflector {
    pub fn resolve_directive(unit: &TypeRef) -> Result<DirectiveReflection> {
        match unit.meta() {
            TypeMeta::Directive(meta) => Ok(DirectiveReflection {
                selector: meta.selector.clone(),
                inputs: meta.inputs.clone(),
                outputs: meta.outputs.clone(),
                template: meta.template.clone(),
                providers: meta.providers.clone(),
                export_as: meta.export_as.clone(),
                structural: meta.structural,
            }),
            _ => Err(ShallowError::NotMockable {
                name: unit.name().to_string(),
            }),
        }
    }

    pub fn resolve_module(module: &TypeRef) -> Result<ModuleReflection> {
        match module.meta() {
            TypeMeta::Module(meta) => Ok(ModuleReflection {
                imports: meta.imports.clone(),
                declarations: meta.declarations.clone(),
                providers: meta.providers.clone(),
                exports: meta.exports.clone(),
                entry_components: meta.entry_components.clone(),
                schemas: meta.schemas.clone(),
            }),
            _ => Err(ShallowError::InvalidModule {
                name: module.name().to_string(),
            }),
        }
    }

    pub fn pipe_name(pipe: &TypeRef) -> Result<String> {
        match pipe.meta() {
            TypeMeta::Pipe(meta) => Ok(meta.pipe_name.clone()),
            _ => Err(ShallowError::NotMockable {
                name: pipe.name().to_string(),
            }),
        }
    }

    /// True for components only (directives with a template).
    pub fn is_component(unit: &TypeRef) -> bool {
        matches!(unit.meta(), TypeMeta::Directive(meta) if meta.template.is_some())
    }

    /// True for directives, components included (directives are the superset).
    pub fn is_directive(unit: &TypeRef) -> bool {
        matches!(unit.meta(), TypeMeta::Directive(_))
    }

    pub fn is_pipe(unit: &TypeRef) -> bool {
        matches!(unit.meta(), TypeMeta::Pipe(_))
    }

    pub fn is_module(unit: &TypeRef) -> bool {
        matches!(unit.meta(), TypeMeta::Module(_))
    }
}
