//! The dependency-graph mocker.
//!
//! Walks declarations, imports, providers and entry components, replacing
//! each member with its generated substitute according to the setup's policy.
//! Resolution order per reference: cache hit, never-mock exemption, module
//! replacement (keyed on the unwrapped module), list recursion, envelope
//! recursion, then capability dispatch. Every result is stored under the
//! original's reference identity so shared references resolve to literally
//! the same mock everywhere.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::cache::{Identity, MockCache};
use crate::error::{Result, ShallowError};
use crate::framework::provider::{
    ModuleImport, ModuleWithProviders, Provide, ProviderEntry, Token,
};
use crate::framework::registry::TypeRef;
use crate::mocks;
use crate::reflect::Reflector;
use crate::setup::TestSetup;

/// A cached mocking result, keyed by the original's reference identity.
#[derive(Clone)]
pub enum Mocked {
    Type(TypeRef),
    Provide(Provide),
    Imports(Arc<Vec<ModuleImport>>),
    Providers(Arc<Vec<ProviderEntry>>),
}

pub type SharedCache = Rc<RefCell<MockCache<Mocked>>>;

pub struct GraphMocker<'a> {
    setup: &'a TestSetup,
    cache: SharedCache,
}

impl<'a> GraphMocker<'a> {
    pub fn new(setup: &'a TestSetup, cache: SharedCache) -> GraphMocker<'a> {
        GraphMocker { setup, cache }
    }

    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    /// Mocks a unit, module or replacement target.
    pub fn mock_type(&self, original: &TypeRef) -> Result<TypeRef> {
        let key = original.identity();
        if let Some(Mocked::Type(hit)) = self.cache.borrow().find(key) {
            return Ok(hit);
        }
        if self.setup.is_dont_mock(key) {
            return Ok(self.store_type(key, original.clone()));
        }
        if let Some(replacement) = self.setup.module_replacements.get(&key) {
            return Ok(self.store_type(key, replacement.clone()));
        }

        let mocked = if Reflector::is_module(original) {
            mocks::module::mock_module(original, self)
        } else if Reflector::is_pipe(original) {
            let transform = self.setup.pipe_transforms.get(&key).cloned();
            mocks::pipe::mock_pipe(original, transform)
        } else if Reflector::is_directive(original) {
            mocks::directive::mock_directive(
                original,
                self.setup.stubs_for(key),
                self.setup.auto_render(key),
            )
        } else {
            return Err(ShallowError::NotMockable {
                name: original.name().to_string(),
            });
        };
        let mocked = mocked.map_err(|source| wrap(original, source))?;
        Ok(self.store_type(key, mocked))
    }

    pub fn mock_import(&self, import: &ModuleImport) -> Result<ModuleImport> {
        match import {
            ModuleImport::Module(module) => Ok(ModuleImport::Module(self.mock_type(module)?)),
            ModuleImport::WithProviders(envelope) => {
                Ok(ModuleImport::WithProviders(self.mock_envelope(envelope)?))
            }
            ModuleImport::List(list) => Ok(ModuleImport::List(self.mock_import_list(list)?)),
        }
    }

    /// Nested import lists are mocked element-wise and cached under the
    /// original list's identity.
    pub fn mock_import_list(
        &self,
        list: &Arc<Vec<ModuleImport>>,
    ) -> Result<Arc<Vec<ModuleImport>>> {
        let key = list.identity();
        if let Some(Mocked::Imports(hit)) = self.cache.borrow().find(key) {
            return Ok(hit);
        }
        let mut mocked = Vec::with_capacity(list.len());
        for import in list.iter() {
            mocked.push(self.mock_import(import)?);
        }
        let mocked = Arc::new(mocked);
        self.cache
            .borrow_mut()
            .add(key, Mocked::Imports(mocked.clone()));
        Ok(mocked)
    }

    /// The envelope is unwrapped for identity checks (never-mock and
    /// replacements key on the inner module) and rewrapped afterward with its
    /// providers mocked individually.
    fn mock_envelope(&self, envelope: &ModuleWithProviders) -> Result<ModuleWithProviders> {
        let module = self.mock_type(&envelope.module)?;
        let mut providers = Vec::with_capacity(envelope.providers.len());
        for entry in &envelope.providers {
            providers.push(self.mock_provider_entry(entry)?);
        }
        Ok(ModuleWithProviders { module, providers })
    }

    pub fn mock_provider_entry(&self, entry: &ProviderEntry) -> Result<ProviderEntry> {
        match entry {
            ProviderEntry::Provide(provide) => {
                Ok(ProviderEntry::Provide(self.mock_provide(provide)?))
            }
            ProviderEntry::List(list) => {
                let key = list.identity();
                if let Some(Mocked::Providers(hit)) = self.cache.borrow().find(key) {
                    return Ok(ProviderEntry::List(hit));
                }
                let mut mocked = Vec::with_capacity(list.len());
                for inner in list.iter() {
                    mocked.push(self.mock_provider_entry(inner)?);
                }
                let mocked = Arc::new(mocked);
                self.cache
                    .borrow_mut()
                    .add(key, Mocked::Providers(mocked.clone()));
                Ok(ProviderEntry::List(mocked))
            }
        }
    }

    /// Providers are keyed by their token's identity, so the same service
    /// provided from two modules yields one shared stub.
    pub fn mock_provide(&self, provide: &Provide) -> Result<Provide> {
        let token = provide.token();
        let key = token.identity();
        // Exemptions and stubs for a class provider are registered under the
        // class reference itself.
        let policy_key = match &token {
            Token::Type(class) => class.identity(),
            Token::Opaque(_) => key,
        };
        if let Some(Mocked::Provide(hit)) = self.cache.borrow().find(key) {
            return Ok(hit);
        }
        if self.setup.is_dont_mock(policy_key) {
            self.cache
                .borrow_mut()
                .add(key, Mocked::Provide(provide.clone()));
            return Ok(provide.clone());
        }
        let mocked = mocks::provider::mock_provide(provide, self.setup.stubs_for(policy_key));
        self.cache
            .borrow_mut()
            .add(key, Mocked::Provide(mocked.clone()));
        Ok(mocked)
    }

    fn store_type(&self, key: crate::cache::CacheKey, value: TypeRef) -> TypeRef {
        self.cache.borrow_mut().add(key, Mocked::Type(value.clone()));
        value
    }
}

fn wrap(original: &TypeRef, source: ShallowError) -> ShallowError {
    ShallowError::MockGeneration {
        name: original.name().to_string(),
        source: Box::new(source),
    }
}
