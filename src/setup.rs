//! Per-scenario test configuration plus the process-wide registries.
//!
//! A `TestSetup` is created fresh for each scenario, seeded from the global
//! registries, mutated by the fluent builder until `render()` is invoked, and
//! read-only from then on. The globals are intentionally shared across every
//! setup created afterwards in the same test process; `reset()` exists for
//! suites that need isolation. Test runners that execute suites on separate
//! threads each see their own registry image.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::cache::{CacheKey, Identity};
use crate::framework::provider::{Provide, ProviderEntry};
use crate::framework::registry::{TransformFn, TypeRef};
use crate::framework::value::{Func, Value};

/// User-supplied property/function overrides merged into a generated mock.
#[derive(Clone, Default)]
pub struct Stubs(IndexMap<String, Value>);

impl Stubs {
    pub fn new() -> Stubs {
        Stubs::default()
    }

    /// A stub callable. The mock generator turns it into a recorded callable
    /// if it does not record already.
    pub fn with_fn(mut self, name: impl Into<String>, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        self.0.insert(name.into(), Value::Func(Func::new(f)));
        self
    }

    /// A stub callable ignoring its arguments and returning `value`.
    pub fn with_returning(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0
            .insert(name.into(), Value::Func(Func::new(move |_| value.clone())));
        self
    }

    /// A plain pass-through property.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Later stubs win key-by-key; keys only present in `self` survive.
    pub fn merge(&mut self, other: &Stubs) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

/// The process-wide registries behind `Shallow::never_mock` and friends.
/// Additive only; `reset` is the single removal operation.
#[derive(Default)]
pub struct GlobalSetup {
    pub never_mock: Vec<CacheKey>,
    pub always_mock: IndexMap<CacheKey, Stubs>,
    pub always_provide: Vec<ProviderEntry>,
    pub always_import: Vec<TypeRef>,
}

impl GlobalSetup {
    pub fn register_always_mock(&mut self, key: CacheKey, stubs: Stubs) {
        match self.always_mock.get_mut(&key) {
            Some(existing) => existing.merge(&stubs),
            None => {
                self.always_mock.insert(key, stubs);
            }
        }
    }
}

thread_local! {
    static GLOBALS: RefCell<GlobalSetup> = RefCell::new(GlobalSetup::default());
}

pub fn with_globals<R>(f: impl FnOnce(&mut GlobalSetup) -> R) -> R {
    GLOBALS.with(|globals| f(&mut globals.borrow_mut()))
}

/// Clears every process-wide registration.
pub fn reset_globals() {
    GLOBALS.with(|globals| *globals.borrow_mut() = GlobalSetup::default());
}

/// The mutable configuration record for one test scenario.
pub struct TestSetup {
    pub test_unit: TypeRef,
    pub test_module: Option<TypeRef>,
    /// References excluded from mocking; always contains the unit under test.
    pub dont_mock: HashSet<CacheKey>,
    /// Per-reference stub overrides, seeded from the global `always_mock`
    /// registrations (deep-copied so later merges never touch the global).
    pub mocks: HashMap<CacheKey, Stubs>,
    /// Stub overrides applied to static members of a class.
    pub static_mocks: Vec<(TypeRef, Stubs)>,
    /// Module reference -> replacement, keyed on the unwrapped module.
    pub module_replacements: HashMap<CacheKey, TypeRef>,
    /// Pipe reference -> replacement transform.
    pub pipe_transforms: HashMap<CacheKey, TransformFn>,
    /// Extra units declared on top of the owning module's declarations.
    pub declarations: Vec<TypeRef>,
    /// Structural directives configured to auto-render embedded content.
    pub structural_auto_render: HashMap<CacheKey, bool>,
    /// Providers always present in the assembled module.
    pub providers: Vec<ProviderEntry>,
    /// Providers run through the provider mocker before being added.
    pub mock_providers: Vec<Provide>,
    /// Modules always imported into the assembled module.
    pub imports: Vec<TypeRef>,
}

impl TestSetup {
    /// Creates a fresh setup seeded from the process-wide registries. The
    /// unit under test itself is always in the never-mock set.
    pub fn new(test_unit: TypeRef, test_module: Option<TypeRef>) -> TestSetup {
        with_globals(|globals| {
            let mut dont_mock: HashSet<CacheKey> =
                globals.never_mock.iter().copied().collect();
            dont_mock.insert(test_unit.identity());
            let mocks = globals
                .always_mock
                .iter()
                .map(|(key, stubs)| (*key, stubs.clone()))
                .collect();
            TestSetup {
                test_unit,
                test_module,
                dont_mock,
                mocks,
                static_mocks: Vec::new(),
                module_replacements: HashMap::new(),
                pipe_transforms: HashMap::new(),
                declarations: Vec::new(),
                structural_auto_render: HashMap::new(),
                providers: globals.always_provide.clone(),
                mock_providers: Vec::new(),
                imports: globals.always_import.clone(),
            }
        })
    }

    pub fn is_dont_mock(&self, key: CacheKey) -> bool {
        self.dont_mock.contains(&key)
    }

    /// Merges `stubs` onto any stubs already registered for `key`.
    pub fn merge_mock(&mut self, key: CacheKey, stubs: Stubs) {
        match self.mocks.get_mut(&key) {
            Some(existing) => existing.merge(&stubs),
            None => {
                self.mocks.insert(key, stubs);
            }
        }
    }

    pub fn stubs_for(&self, key: CacheKey) -> Option<&Stubs> {
        self.mocks.get(&key)
    }

    pub fn auto_render(&self, key: CacheKey) -> bool {
        self.structural_auto_render.get(&key).copied().unwrap_or(false)
    }
}
