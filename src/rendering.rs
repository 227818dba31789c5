//! The rendering result and its query façade.
//!
//! Queries resolve originals through the mock cache, so looking up a mocked
//! collaborator by its original reference transparently matches the mock.
//! Query results are an explicit matched-set view: a single result forwards
//! property access, a multi-result supports iteration only, and an empty
//! result fails loudly on any access so a typo'd selector surfaces
//! immediately instead of as a silent `undefined` three lines later.

use crate::error::{Result, ShallowError};
use crate::framework::provider::Token;
use crate::framework::registry::{TypeMeta, TypeRef};
use crate::framework::renderer::{DebugElement, Fixture};
use crate::framework::value::{Emitter, Obj, Value};
use crate::graph::{Mocked, SharedCache};
use crate::selector;
use crate::setup::Stubs;

/// What `find` accepts: a CSS selector or an original unit reference.
pub enum QueryTarget {
    Css(String),
    Ref(TypeRef),
}

impl From<&str> for QueryTarget {
    fn from(selector: &str) -> QueryTarget {
        QueryTarget::Css(selector.to_string())
    }
}

impl From<&TypeRef> for QueryTarget {
    fn from(unit: &TypeRef) -> QueryTarget {
        QueryTarget::Ref(unit.clone())
    }
}

/// Zero, one or many query results.
#[derive(Clone)]
pub enum QueryMatch<T> {
    Empty { query: String },
    Single { query: String, item: T },
    Many { query: String, items: Vec<T> },
}

impl<T: Clone> QueryMatch<T> {
    pub fn from_vec(query: impl Into<String>, mut items: Vec<T>) -> QueryMatch<T> {
        let query = query.into();
        match items.len() {
            0 => QueryMatch::Empty { query },
            1 => QueryMatch::Single {
                query,
                item: items.remove(0),
            },
            _ => QueryMatch::Many { query, items },
        }
    }

    pub fn query(&self) -> &str {
        match self {
            QueryMatch::Empty { query }
            | QueryMatch::Single { query, .. }
            | QueryMatch::Many { query, .. } => query,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryMatch::Empty { .. } => 0,
            QueryMatch::Single { .. } => 1,
            QueryMatch::Many { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> &[T] {
        match self {
            QueryMatch::Empty { .. } => &[],
            QueryMatch::Single { item, .. } => std::slice::from_ref(item),
            QueryMatch::Many { items, .. } => items,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items().iter()
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Vec<U> {
        self.items().iter().map(f).collect()
    }

    /// The single result; fails on zero or many matches.
    pub fn one(&self) -> Result<&T> {
        match self {
            QueryMatch::Empty { query } => Err(ShallowError::NoMatches {
                query: query.clone(),
            }),
            QueryMatch::Single { item, .. } => Ok(item),
            QueryMatch::Many { query, items } => Err(ShallowError::MultipleMatches {
                query: query.clone(),
                count: items.len(),
            }),
        }
    }

    // Assertion vocabulary for tests; these panic with a readable message the
    // way matcher extensions do.

    pub fn assert_found(&self, expected: usize) -> &Self {
        assert!(
            self.len() == expected,
            "expected query '{}' to find exactly {expected}, found {}",
            self.query(),
            self.len()
        );
        self
    }

    pub fn assert_found_one(&self) -> &T {
        match self.one() {
            Ok(item) => item,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn assert_found_more_than(&self, floor: usize) -> &Self {
        assert!(
            self.len() > floor,
            "expected query '{}' to find more than {floor}, found {}",
            self.query(),
            self.len()
        );
        self
    }

    pub fn assert_found_less_than(&self, ceiling: usize) -> &Self {
        assert!(
            self.len() < ceiling,
            "expected query '{}' to find less than {ceiling}, found {}",
            self.query(),
            self.len()
        );
        self
    }
}

impl QueryMatch<Obj> {
    /// Property read through a single-result view.
    pub fn prop(&self, name: &str) -> Result<Value> {
        Ok(self.one()?.get(name).unwrap_or(Value::Undefined))
    }

    pub fn set_prop(&self, name: &str, value: Value) -> Result<()> {
        self.one()?.set(name, value);
        Ok(())
    }

    pub fn has_prop(&self, name: &str) -> Result<bool> {
        Ok(self.one()?.has(name))
    }

    pub fn remove_prop(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.one()?.remove(name))
    }

    /// Invokes a callable property on the single result.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let instance = self.one()?;
        match instance.get(name) {
            Some(Value::Func(f)) => Ok(f.call(args)),
            _ => Err(ShallowError::NoMatches {
                query: format!("{}.{name}()", self.query()),
            }),
        }
    }
}

impl QueryMatch<DebugElement> {
    pub fn text(&self) -> Result<String> {
        Ok(self.one()?.text())
    }

    pub fn instance(&self) -> Result<Obj> {
        let element = self.one()?;
        element
            .component_instance()
            .or_else(|| {
                element
                    .directive_instances()
                    .into_iter()
                    .next()
                    .map(|(_, instance)| instance)
            })
            .ok_or_else(|| ShallowError::NoMatches {
                query: self.query().to_string(),
            })
    }
}

/// The live result of one `render()` call.
pub struct Rendering {
    pub instance: Obj,
    pub element: DebugElement,
    pub fixture: Fixture,
    /// The bind record supplied by the test author.
    pub bindings: Stubs,
    unit: TypeRef,
    cache: SharedCache,
}

impl Rendering {
    pub(crate) fn new(
        instance: Obj,
        element: DebugElement,
        fixture: Fixture,
        bindings: Stubs,
        unit: TypeRef,
        cache: SharedCache,
    ) -> Rendering {
        Rendering {
            instance,
            element,
            fixture,
            bindings,
            unit,
            cache,
        }
    }

    /// Resolves an original reference to its mock, if one was generated.
    fn resolve(&self, unit: &TypeRef) -> TypeRef {
        use crate::cache::Identity;
        match self.cache.borrow().find(unit.identity()) {
            Some(Mocked::Type(mock)) => mock,
            _ => unit.clone(),
        }
    }

    fn guard_test_component(&self, query: &str, elements: &[DebugElement]) -> Result<()> {
        for element in elements {
            if let Some(instance) = element.component_instance() {
                if instance.ptr_eq(&self.instance) {
                    return Err(ShallowError::MatchedTestComponent {
                        query: query.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Finds elements by CSS selector or by original unit reference.
    pub fn find(&self, target: impl Into<QueryTarget>) -> Result<QueryMatch<DebugElement>> {
        self.fixture.sync_structural_views()?;
        match target.into() {
            QueryTarget::Css(css) => {
                let mut matched = Vec::new();
                for element in self.fixture.elements() {
                    if selector::matches_selector(&css, &element.as_selector_target())? {
                        matched.push(element);
                    }
                }
                self.guard_test_component(&css, &matched)?;
                Ok(QueryMatch::from_vec(css, matched))
            }
            QueryTarget::Ref(unit) => {
                let resolved = self.resolve(&unit);
                let matched: Vec<DebugElement> = self
                    .fixture
                    .instances_of(&resolved)
                    .into_iter()
                    .filter_map(|(_, element)| element)
                    .collect();
                self.guard_test_component(unit.name(), &matched)?;
                Ok(QueryMatch::from_vec(unit.name(), matched))
            }
        }
    }

    /// Finds component instances of `unit` (or of its mock).
    pub fn find_component(&self, unit: &TypeRef) -> Result<QueryMatch<Obj>> {
        self.find_instances(unit)
    }

    /// Finds directive instances of `unit` (or of its mock), including
    /// structural-directive instances whose content is not materialized.
    pub fn find_directive(&self, unit: &TypeRef) -> Result<QueryMatch<Obj>> {
        self.find_instances(unit)
    }

    fn find_instances(&self, unit: &TypeRef) -> Result<QueryMatch<Obj>> {
        self.fixture.sync_structural_views()?;
        let resolved = self.resolve(unit);
        let instances: Vec<Obj> = self
            .fixture
            .instances_of(&resolved)
            .into_iter()
            .map(|(instance, _)| instance)
            .collect();
        for instance in &instances {
            if instance.ptr_eq(&self.instance) {
                return Err(ShallowError::MatchedTestComponent {
                    query: unit.name().to_string(),
                });
            }
        }
        Ok(QueryMatch::from_vec(unit.name(), instances))
    }

    /// Resolves an arbitrary token from the assembled test module.
    pub fn get(&self, token: impl Into<Token>) -> Result<Value> {
        self.fixture.injector().get(&token.into())
    }

    /// The emitter behind a declared output of the unit under test. Fails
    /// when the name is not a declared output or the property holds no
    /// emitter, so a typo'd emission assertion cannot silently pass.
    pub fn outputs(&self, name: &str) -> Result<Emitter> {
        let meta = match self.unit.meta() {
            TypeMeta::Directive(meta) => meta,
            _ => {
                return Err(ShallowError::NotAnOutput {
                    name: name.to_string(),
                    unit: self.unit.name().to_string(),
                })
            }
        };
        let output = meta
            .outputs
            .iter()
            .find(|output| output.matches(name))
            .ok_or_else(|| ShallowError::NotAnOutput {
                name: name.to_string(),
                unit: self.unit.name().to_string(),
            })?;
        match self.instance.get(&output.property) {
            Some(Value::Emitter(emitter)) => Ok(emitter),
            _ => Err(ShallowError::NotAnEmitter {
                name: name.to_string(),
                unit: self.unit.name().to_string(),
            }),
        }
    }
}
