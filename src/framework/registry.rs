//! The explicit metadata table standing in for the host framework's
//! decorator/reflection surface.
//!
//! A `TypeRef` is a reference-identity handle to a unit, module, or service
//! definition. All comparisons and cache keys in the harness use pointer
//! identity, never structural equality, mirroring how class references behave
//! in the host framework.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::framework::injector::Injector;
use crate::framework::provider::{ModuleImport, ProviderEntry};
use crate::framework::value::{Obj, Value};

/// Populates a freshly created directive/component instance.
pub type ConstructFn = Rc<dyn Fn(&Injector, &Obj)>;

/// Produces a service instance.
pub type ServiceCtor = Rc<dyn Fn(&Injector) -> Value>;

/// A pipe transform; the first argument is the piped input value.
pub type TransformFn = Rc<dyn Fn(&[Value]) -> Value>;

/// One input or output declaration: class property name plus the external
/// alias templates bind against (`None` means the property name is public).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBinding {
    pub property: String,
    pub alias: Option<String>,
}

impl PropertyBinding {
    pub fn new(property: impl Into<String>, alias: Option<&str>) -> PropertyBinding {
        PropertyBinding {
            property: property.into(),
            alias: alias.map(str::to_string),
        }
    }

    /// The name templates see.
    pub fn public_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.property)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.public_name() == name || self.property == name
    }
}

/// Metadata carried by a component or directive. A component is a directive
/// with a template (directives are the superset).
#[derive(Clone, Default)]
pub struct DirectiveMetadata {
    pub selector: Option<String>,
    pub inputs: Vec<PropertyBinding>,
    pub outputs: Vec<PropertyBinding>,
    pub export_as: Option<String>,
    pub template: Option<String>,
    pub providers: Vec<ProviderEntry>,
    pub structural: bool,
    pub construct: Option<ConstructFn>,
}

#[derive(Clone, Default)]
pub struct PipeMetadata {
    /// The name templates invoke the pipe by.
    pub pipe_name: String,
    pub transform: Option<TransformFn>,
}

#[derive(Clone, Default)]
pub struct ModuleMetadata {
    pub imports: Vec<ModuleImport>,
    pub declarations: Vec<TypeRef>,
    pub providers: Vec<ProviderEntry>,
    pub exports: Vec<TypeRef>,
    pub entry_components: Vec<TypeRef>,
    pub schemas: Vec<String>,
}

#[derive(Clone, Default)]
pub struct ServiceMetadata {
    pub construct: Option<ServiceCtor>,
}

#[derive(Clone)]
pub enum TypeMeta {
    Directive(DirectiveMetadata),
    Pipe(PipeMetadata),
    Module(ModuleMetadata),
    Service(ServiceMetadata),
}

pub struct TypeDef {
    pub name: String,
    pub meta: TypeMeta,
    /// Static members of the class; `mock_static` patches these in place.
    pub statics: RefCell<IndexMap<String, Value>>,
    /// Back-reference from a generated mock to its original.
    pub mock_of: Option<TypeRef>,
}

/// Reference-identity handle to a definition.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeDef>);

impl TypeRef {
    pub fn new(def: TypeDef) -> TypeRef {
        TypeRef(Arc::new(def))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn meta(&self) -> &TypeMeta {
        &self.0.meta
    }

    pub fn statics(&self) -> &RefCell<IndexMap<String, Value>> {
        &self.0.statics
    }

    /// The original this definition was generated from, if it is a mock.
    pub fn mock_of(&self) -> Option<&TypeRef> {
        self.0.mock_of.as_ref()
    }

    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &TypeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

fn define(name: impl Into<String>, meta: TypeMeta, mock_of: Option<TypeRef>) -> TypeRef {
    TypeRef::new(TypeDef {
        name: name.into(),
        meta,
        statics: RefCell::new(IndexMap::new()),
        mock_of,
    })
}

/// Builder for component definitions (a directive with a template).
pub struct ComponentDef {
    name: String,
    meta: DirectiveMetadata,
    statics: IndexMap<String, Value>,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>) -> ComponentDef {
        ComponentDef {
            name: name.into(),
            meta: DirectiveMetadata {
                template: Some(String::new()),
                ..DirectiveMetadata::default()
            },
            statics: IndexMap::new(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.meta.selector = Some(selector.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.meta.template = Some(template.into());
        self
    }

    pub fn input(mut self, property: impl Into<String>, alias: Option<&str>) -> Self {
        self.meta.inputs.push(PropertyBinding::new(property, alias));
        self
    }

    pub fn output(mut self, property: impl Into<String>, alias: Option<&str>) -> Self {
        self.meta.outputs.push(PropertyBinding::new(property, alias));
        self
    }

    pub fn export_as(mut self, name: impl Into<String>) -> Self {
        self.meta.export_as = Some(name.into());
        self
    }

    pub fn provider(mut self, entry: ProviderEntry) -> Self {
        self.meta.providers.push(entry);
        self
    }

    pub fn construct(mut self, f: impl Fn(&Injector, &Obj) + 'static) -> Self {
        self.meta.construct = Some(Rc::new(f));
        self
    }

    pub fn static_member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.insert(name.into(), value);
        self
    }

    pub fn define(self) -> TypeRef {
        let type_ref = define(self.name, TypeMeta::Directive(self.meta), None);
        *type_ref.statics().borrow_mut() = self.statics;
        type_ref
    }
}

/// Builder for (template-less) directive definitions.
pub struct DirectiveDef {
    name: String,
    meta: DirectiveMetadata,
}

impl DirectiveDef {
    pub fn new(name: impl Into<String>) -> DirectiveDef {
        DirectiveDef {
            name: name.into(),
            meta: DirectiveMetadata::default(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.meta.selector = Some(selector.into());
        self
    }

    /// Marks the directive as structural (usable through the `*dir` shorthand).
    pub fn structural(mut self) -> Self {
        self.meta.structural = true;
        self
    }

    pub fn input(mut self, property: impl Into<String>, alias: Option<&str>) -> Self {
        self.meta.inputs.push(PropertyBinding::new(property, alias));
        self
    }

    pub fn output(mut self, property: impl Into<String>, alias: Option<&str>) -> Self {
        self.meta.outputs.push(PropertyBinding::new(property, alias));
        self
    }

    pub fn export_as(mut self, name: impl Into<String>) -> Self {
        self.meta.export_as = Some(name.into());
        self
    }

    pub fn construct(mut self, f: impl Fn(&Injector, &Obj) + 'static) -> Self {
        self.meta.construct = Some(Rc::new(f));
        self
    }

    pub fn define(self) -> TypeRef {
        define(self.name, TypeMeta::Directive(self.meta), None)
    }
}

/// Builder for pipe definitions.
pub struct PipeDef {
    name: String,
    meta: PipeMetadata,
}

impl PipeDef {
    pub fn new(name: impl Into<String>, pipe_name: impl Into<String>) -> PipeDef {
        PipeDef {
            name: name.into(),
            meta: PipeMetadata {
                pipe_name: pipe_name.into(),
                transform: None,
            },
        }
    }

    pub fn transform(mut self, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        self.meta.transform = Some(Rc::new(f));
        self
    }

    pub fn define(self) -> TypeRef {
        define(self.name, TypeMeta::Pipe(self.meta), None)
    }
}

/// Builder for module definitions.
pub struct ModuleDef {
    name: String,
    meta: ModuleMetadata,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>) -> ModuleDef {
        ModuleDef {
            name: name.into(),
            meta: ModuleMetadata::default(),
        }
    }

    pub fn import(mut self, import: impl Into<ModuleImport>) -> Self {
        self.meta.imports.push(import.into());
        self
    }

    pub fn declaration(mut self, unit: &TypeRef) -> Self {
        self.meta.declarations.push(unit.clone());
        self
    }

    pub fn provider(mut self, entry: impl Into<ProviderEntry>) -> Self {
        self.meta.providers.push(entry.into());
        self
    }

    pub fn export(mut self, unit: &TypeRef) -> Self {
        self.meta.exports.push(unit.clone());
        self
    }

    pub fn entry_component(mut self, unit: &TypeRef) -> Self {
        self.meta.entry_components.push(unit.clone());
        self
    }

    pub fn schema(mut self, name: impl Into<String>) -> Self {
        self.meta.schemas.push(name.into());
        self
    }

    pub fn define(self) -> TypeRef {
        define(self.name, TypeMeta::Module(self.meta), None)
    }
}

/// Builder for injectable service definitions.
pub struct ServiceDef {
    name: String,
    meta: ServiceMetadata,
    statics: IndexMap<String, Value>,
}

impl ServiceDef {
    pub fn new(name: impl Into<String>) -> ServiceDef {
        ServiceDef {
            name: name.into(),
            meta: ServiceMetadata::default(),
            statics: IndexMap::new(),
        }
    }

    pub fn construct(mut self, f: impl Fn(&Injector) -> Value + 'static) -> Self {
        self.meta.construct = Some(Rc::new(f));
        self
    }

    pub fn static_member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.insert(name.into(), value);
        self
    }

    pub fn define(self) -> TypeRef {
        let type_ref = define(self.name, TypeMeta::Service(self.meta), None);
        *type_ref.statics().borrow_mut() = self.statics;
        type_ref
    }
}

/// Internal constructor used by the mock generators: a definition tagged with
/// the original it substitutes for.
pub(crate) fn define_mock(name: String, meta: TypeMeta, original: TypeRef) -> TypeRef {
    define(name, meta, Some(original))
}

thread_local! {
    static COMMON_MODULE: TypeRef = ModuleDef::new("CommonTemplateModule").define();
}

/// The baseline module every assembled test module imports, the slot where
/// the host framework's common template directives live.
pub fn common_module() -> TypeRef {
    COMMON_MODULE.with(TypeRef::clone)
}
