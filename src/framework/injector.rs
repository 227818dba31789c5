//! Token resolution over a flattened provider list.
//!
//! Instances are memoized per injector, so two injection sites asking for the
//! same token observe the same instance (dependency-injection identity).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{Result, ShallowError};
use crate::framework::provider::{flatten_providers, Provide, ProviderEntry, Token};
use crate::framework::registry::{TypeMeta, TypeRef};
use crate::framework::value::{Obj, Value};

struct InjectorInner {
    records: HashMap<Token, Provide>,
    instances: RefCell<HashMap<Token, Value>>,
    resolving: RefCell<HashSet<Token>>,
}

#[derive(Clone)]
pub struct Injector {
    inner: Rc<InjectorInner>,
}

impl Injector {
    /// Builds an injector from a provider tree. Later providers for the same
    /// token win, matching the host framework's override order.
    pub fn new(entries: &[ProviderEntry]) -> Injector {
        let mut flat = Vec::new();
        flatten_providers(entries, &mut flat);
        let mut records = HashMap::new();
        for provide in flat {
            records.insert(provide.token(), provide);
        }
        Injector {
            inner: Rc::new(InjectorInner {
                records,
                instances: RefCell::new(HashMap::new()),
                resolving: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub fn has(&self, token: &Token) -> bool {
        self.inner.records.contains_key(token)
    }

    pub fn get(&self, token: &Token) -> Result<Value> {
        if let Some(existing) = self.inner.instances.borrow().get(token) {
            return Ok(existing.clone());
        }
        let provide = self
            .inner
            .records
            .get(token)
            .cloned()
            .ok_or_else(|| ShallowError::NoProvider {
                token: token.name().to_string(),
            })?;

        if !self.inner.resolving.borrow_mut().insert(token.clone()) {
            return Err(ShallowError::CircularDependency {
                token: token.name().to_string(),
            });
        }
        let resolved = self.instantiate(&provide);
        self.inner.resolving.borrow_mut().remove(token);
        let value = resolved?;
        self.inner
            .instances
            .borrow_mut()
            .insert(token.clone(), value.clone());
        Ok(value)
    }

    /// Convenience for class tokens.
    pub fn get_type(&self, type_ref: &TypeRef) -> Result<Value> {
        self.get(&Token::Type(type_ref.clone()))
    }

    fn instantiate(&self, provide: &Provide) -> Result<Value> {
        match provide {
            Provide::Class(class) | Provide::TokenClass { class, .. } => {
                self.construct_class(class)
            }
            Provide::TokenValue { value, .. } => Ok(value.clone()),
            Provide::TokenFactory { factory, deps, .. } => {
                let mut args = Vec::with_capacity(deps.len());
                for dep in deps {
                    args.push(self.get(dep)?);
                }
                Ok(factory(&args))
            }
            Provide::Existing { existing, .. } => self.get(existing),
        }
    }

    fn construct_class(&self, class: &TypeRef) -> Result<Value> {
        match class.meta() {
            TypeMeta::Service(meta) => match &meta.construct {
                Some(ctor) => Ok(ctor(self)),
                None => Ok(Value::Obj(Obj::new())),
            },
            // Non-service classes provided directly resolve to a bare record;
            // the harness never routes rendering through them.
            _ => Ok(Value::Obj(Obj::new())),
        }
    }
}
