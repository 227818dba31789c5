//! Provider and import shapes.
//!
//! The five provider variants of the host framework, a nestable provider
//! list, and the module-import forms (bare module, module-with-providers
//! envelope, nested list). Lists are `Arc`-backed so they carry the reference
//! identity the mock cache keys on.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use crate::framework::registry::TypeRef;
use crate::framework::value::Value;

/// An opaque injection token (the non-class token form).
#[derive(Clone)]
pub struct InjectionToken(Arc<String>);

impl InjectionToken {
    pub fn new(name: impl Into<String>) -> InjectionToken {
        InjectionToken(Arc::new(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for InjectionToken {
    fn eq(&self, other: &InjectionToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for InjectionToken {}

impl Hash for InjectionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for InjectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InjectionToken({})", self.name())
    }
}

/// What a provider resolves for: a class reference or an opaque token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Type(TypeRef),
    Opaque(InjectionToken),
}

impl Token {
    pub fn name(&self) -> &str {
        match self {
            Token::Type(t) => t.name(),
            Token::Opaque(t) => t.name(),
        }
    }

    pub fn addr(&self) -> usize {
        match self {
            Token::Type(t) => t.addr(),
            Token::Opaque(t) => t.addr(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.name())
    }
}

impl From<&TypeRef> for Token {
    fn from(t: &TypeRef) -> Token {
        Token::Type(t.clone())
    }
}

impl From<&InjectionToken> for Token {
    fn from(t: &InjectionToken) -> Token {
        Token::Opaque(t.clone())
    }
}

/// A provider factory function.
pub type FactoryFn = Rc<dyn Fn(&[Value]) -> Value>;

/// The recognized provider shapes.
#[derive(Clone)]
pub enum Provide {
    /// The class is its own token.
    Class(TypeRef),
    /// `{ provide: token, useClass: class }`
    TokenClass { token: Token, class: TypeRef },
    /// `{ provide: token, useValue: value }`
    TokenValue { token: Token, value: Value },
    /// `{ provide: token, useFactory: factory, deps: [...] }`
    TokenFactory {
        token: Token,
        factory: FactoryFn,
        deps: Vec<Token>,
    },
    /// `{ provide: token, useExisting: other }`: aliases another token.
    Existing { token: Token, existing: Token },
}

impl Provide {
    pub fn value(token: impl Into<Token>, value: Value) -> Provide {
        Provide::TokenValue {
            token: token.into(),
            value,
        }
    }

    pub fn factory(
        token: impl Into<Token>,
        deps: Vec<Token>,
        factory: impl Fn(&[Value]) -> Value + 'static,
    ) -> Provide {
        Provide::TokenFactory {
            token: token.into(),
            factory: Rc::new(factory),
            deps,
        }
    }

    pub fn existing(token: impl Into<Token>, existing: impl Into<Token>) -> Provide {
        Provide::Existing {
            token: token.into(),
            existing: existing.into(),
        }
    }

    /// The token this provider satisfies.
    pub fn token(&self) -> Token {
        match self {
            Provide::Class(t) => Token::Type(t.clone()),
            Provide::TokenClass { token, .. }
            | Provide::TokenValue { token, .. }
            | Provide::TokenFactory { token, .. }
            | Provide::Existing { token, .. } => token.clone(),
        }
    }
}

impl fmt::Debug for Provide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provide::Class(t) => write!(f, "Provide::Class({})", t.name()),
            Provide::TokenClass { token, class } => {
                write!(f, "Provide::TokenClass({} -> {})", token.name(), class.name())
            }
            Provide::TokenValue { token, .. } => {
                write!(f, "Provide::TokenValue({})", token.name())
            }
            Provide::TokenFactory { token, .. } => {
                write!(f, "Provide::TokenFactory({})", token.name())
            }
            Provide::Existing { token, existing } => {
                write!(f, "Provide::Existing({} -> {})", token.name(), existing.name())
            }
        }
    }
}

/// A provider list entry: a single provider or a nested list. Nested lists
/// must be recursed over, never iterated shallowly.
#[derive(Clone, Debug)]
pub enum ProviderEntry {
    Provide(Provide),
    List(Arc<Vec<ProviderEntry>>),
}

impl ProviderEntry {
    pub fn list(entries: Vec<ProviderEntry>) -> ProviderEntry {
        ProviderEntry::List(Arc::new(entries))
    }
}

impl From<Provide> for ProviderEntry {
    fn from(p: Provide) -> ProviderEntry {
        ProviderEntry::Provide(p)
    }
}

impl From<&TypeRef> for ProviderEntry {
    fn from(t: &TypeRef) -> ProviderEntry {
        ProviderEntry::Provide(Provide::Class(t.clone()))
    }
}

/// Flattens a provider tree into individual providers, depth first.
pub fn flatten_providers(entries: &[ProviderEntry], out: &mut Vec<Provide>) {
    for entry in entries {
        match entry {
            ProviderEntry::Provide(p) => out.push(p.clone()),
            ProviderEntry::List(list) => flatten_providers(list, out),
        }
    }
}

/// A module reference plus an extra provider list. Unwrapped before graph
/// traversal, rewrapped afterward; identity checks key on the inner module.
#[derive(Clone, Debug)]
pub struct ModuleWithProviders {
    pub module: TypeRef,
    pub providers: Vec<ProviderEntry>,
}

/// One entry of a module's `imports` list.
#[derive(Clone, Debug)]
pub enum ModuleImport {
    Module(TypeRef),
    WithProviders(ModuleWithProviders),
    List(Arc<Vec<ModuleImport>>),
}

impl ModuleImport {
    pub fn list(imports: Vec<ModuleImport>) -> ModuleImport {
        ModuleImport::List(Arc::new(imports))
    }
}

impl From<&TypeRef> for ModuleImport {
    fn from(t: &TypeRef) -> ModuleImport {
        ModuleImport::Module(t.clone())
    }
}

impl From<ModuleWithProviders> for ModuleImport {
    fn from(m: ModuleWithProviders) -> ModuleImport {
        ModuleImport::WithProviders(m)
    }
}
