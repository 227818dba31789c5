//! Module mocks: every import, declaration, export, entry component and
//! provider is mocked recursively through the graph mocker, then wrapped in a
//! fresh module definition tagged as a mock of the original.

use crate::error::Result;
use crate::framework::registry::{define_mock, ModuleMetadata, TypeMeta, TypeRef};
use crate::graph::GraphMocker;
use crate::reflect::Reflector;

pub fn mock_module(original: &TypeRef, mocker: &GraphMocker<'_>) -> Result<TypeRef> {
    let reflection = Reflector::resolve_module(original)?;

    let mut imports = Vec::with_capacity(reflection.imports.len());
    for import in &reflection.imports {
        imports.push(mocker.mock_import(import)?);
    }
    let mut declarations = Vec::with_capacity(reflection.declarations.len());
    for declaration in &reflection.declarations {
        declarations.push(mocker.mock_type(declaration)?);
    }
    let mut providers = Vec::with_capacity(reflection.providers.len());
    for provider in &reflection.providers {
        providers.push(mocker.mock_provider_entry(provider)?);
    }
    let mut exports = Vec::with_capacity(reflection.exports.len());
    for export in &reflection.exports {
        exports.push(mocker.mock_type(export)?);
    }
    let mut entry_components = Vec::with_capacity(reflection.entry_components.len());
    for entry in &reflection.entry_components {
        entry_components.push(mocker.mock_type(entry)?);
    }

    let meta = ModuleMetadata {
        imports,
        declarations,
        providers,
        exports,
        entry_components,
        schemas: reflection.schemas.clone(),
    };
    Ok(define_mock(
        format!("MockOf{}", original.name()),
        TypeMeta::Module(meta),
        original.clone(),
    ))
}
