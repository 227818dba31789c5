//! Assembles the synthetic test module handed to the host renderer.
//!
//! Declarations are the mocked originals plus extra user declarations plus
//! the generated container; imports are the mocked originals plus the
//! baseline common module plus always-imports; providers are the mocked
//! originals plus setup-level providers. Everything is re-exported so nested
//! lookups resolve.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cache::{Identity, MockCache};
use crate::error::{Result, ShallowError};
use crate::framework::provider::{ModuleImport, ProviderEntry};
use crate::framework::registry::{common_module, ComponentDef, ModuleDef, TypeRef};
use crate::framework::value::Value;
use crate::graph::{GraphMocker, SharedCache};
use crate::reflect::{ModuleReflection, Reflector};
use crate::setup::{Stubs, TestSetup};

/// How the unit under test is hosted.
pub enum ContainerSpec {
    /// A literal template supplied by the caller; the container wraps it.
    Template(String),
    /// No template: the container is the unit under test itself.
    Bare,
}

/// Where the caller's bind record lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    /// Applied to the root instance on every change-detection pass.
    Root,
    /// Applied once to the located unit instance (directive under test).
    Unit,
}

pub struct AssembledTest {
    pub module: TypeRef,
    pub root: TypeRef,
    /// True when the root component is the unit under test itself.
    pub bare: bool,
    pub bind_target: BindTarget,
    /// Bind record resolved to class property names.
    pub bound: Vec<(String, Value)>,
    pub cache: SharedCache,
}

pub fn assemble(
    setup: &TestSetup,
    container: ContainerSpec,
    bind: &Stubs,
) -> Result<AssembledTest> {
    let reflection = match &setup.test_module {
        Some(module) => Reflector::resolve_module(module)?,
        None => ModuleReflection::default(),
    };

    apply_static_mocks(setup)?;

    let cache: SharedCache = Rc::new(RefCell::new(MockCache::new()));
    let mocker = GraphMocker::new(setup, cache.clone());

    let mut declarations = Vec::new();
    for declaration in &reflection.declarations {
        declarations.push(mocker.mock_type(declaration)?);
    }
    let unit_declared = declarations.iter().any(|d| *d == setup.test_unit);
    if !unit_declared
        && (Reflector::is_directive(&setup.test_unit) || Reflector::is_pipe(&setup.test_unit))
    {
        declarations.push(setup.test_unit.clone());
    }
    for extra in &setup.declarations {
        if !declarations.iter().any(|d| d == extra) {
            declarations.push(extra.clone());
        }
    }

    let mut imports = vec![ModuleImport::Module(common_module())];
    for import in &reflection.imports {
        imports.push(mocker.mock_import(import)?);
    }
    for module in &setup.imports {
        imports.push(ModuleImport::Module(module.clone()));
    }

    let mut providers = Vec::new();
    for provider in &reflection.providers {
        providers.push(mocker.mock_provider_entry(provider)?);
    }
    for provide in &setup.mock_providers {
        providers.push(ProviderEntry::Provide(mocker.mock_provide(provide)?));
    }
    providers.extend(setup.providers.iter().cloned());

    let is_entry_component = reflection
        .entry_components
        .iter()
        .any(|e| e.identity() == setup.test_unit.identity());

    let (root, bare, bind_target, bound) = match container {
        ContainerSpec::Template(template) => {
            let container_type = ComponentDef::new("TestContainer")
                .template(template)
                .define();
            let bound = bind
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            (container_type, false, BindTarget::Root, bound)
        }
        ContainerSpec::Bare => {
            let bound = resolve_unit_bindings(setup, bind, is_entry_component)?;
            if Reflector::is_component(&setup.test_unit) {
                (setup.test_unit.clone(), true, BindTarget::Root, bound)
            } else {
                // A template-less directive gets a generated host element.
                let host = host_template_for(&setup.test_unit)?;
                let container_type = ComponentDef::new("TestContainer").template(host).define();
                (container_type, false, BindTarget::Unit, bound)
            }
        }
    };

    if !declarations.iter().any(|d| *d == root) {
        declarations.push(root.clone());
    }

    let mut module = ModuleDef::new("ShallowTestModule");
    for import in imports {
        module = module.import(import);
    }
    for declaration in &declarations {
        module = module.declaration(declaration);
        module = module.export(declaration);
    }
    for provider in providers {
        module = module.provider(provider);
    }
    let module = module.define();

    Ok(AssembledTest {
        module,
        root,
        bare,
        bind_target,
        bound,
        cache,
    })
}

/// Validates the bind record against the unit's declared inputs and resolves
/// each key to its class property name.
fn resolve_unit_bindings(
    setup: &TestSetup,
    bind: &Stubs,
    is_entry_component: bool,
) -> Result<Vec<(String, Value)>> {
    if bind.is_empty() {
        return Ok(Vec::new());
    }
    let reflection = Reflector::resolve_directive(&setup.test_unit)?;
    let mut bound = Vec::new();
    for (name, value) in bind.iter() {
        if is_entry_component {
            return Err(ShallowError::InvalidBindOnEntryComponent {
                property: name.clone(),
                unit: setup.test_unit.name().to_string(),
            });
        }
        let input = reflection
            .inputs
            .iter()
            .find(|input| input.matches(name))
            .ok_or_else(|| ShallowError::NotAnInput {
                property: name.clone(),
                unit: setup.test_unit.name().to_string(),
            })?;
        bound.push((input.property.clone(), value.clone()));
    }
    Ok(bound)
}

/// `<div attr></div>` host for an attribute directive under test.
fn host_template_for(unit: &TypeRef) -> Result<String> {
    let reflection = Reflector::resolve_directive(unit)?;
    let selector = reflection.selector.as_deref().unwrap_or_default();
    let parsed = crate::selector::CssSelector::parse(selector)?;
    let first = parsed.first().ok_or_else(|| ShallowError::NotMockable {
        name: unit.name().to_string(),
    })?;
    if let Some((attr, _)) = first.attrs.first() {
        return Ok(format!("<div {attr}></div>"));
    }
    if let Some(element) = &first.element {
        return Ok(format!("<{element}></{element}>"));
    }
    Err(ShallowError::NotMockable {
        name: unit.name().to_string(),
    })
}

/// Patches static-member stubs onto their targets, verifying each target is a
/// function on both sides.
fn apply_static_mocks(setup: &TestSetup) -> Result<()> {
    for (target, stubs) in &setup.static_mocks {
        for (name, value) in stubs.iter() {
            let func = match value {
                Value::Func(f) => f.ensure_recorded(),
                _ => {
                    return Err(ShallowError::StaticMockNotAFunction {
                        name: target.name().to_string(),
                        target: name.clone(),
                    })
                }
            };
            let existing = target.statics().borrow().get(name).cloned();
            match existing {
                Some(Value::Func(_)) => {
                    target
                        .statics()
                        .borrow_mut()
                        .insert(name.clone(), Value::Func(func));
                }
                _ => {
                    return Err(ShallowError::StaticMockNotAFunction {
                        name: target.name().to_string(),
                        target: name.clone(),
                    })
                }
            }
        }
    }
    Ok(())
}
