//! The fluent entry point.
//!
//! A `Shallow` owns one scenario's configuration. Every chainable call
//! records a policy on the setup; nothing is mocked or rendered until
//! `render*` (or `create_service`) consumes the builder. The associated
//! functions mutate the process-wide registries that seed every later setup.

use std::cell::RefCell;
use std::rc::Rc;

use crate::assembler::{self, BindTarget, ContainerSpec};
use crate::cache::{Identity, MockCache};
use crate::error::{Result, ShallowError};
use crate::framework::injector::Injector;
use crate::framework::provider::{InjectionToken, Provide, ProviderEntry, Token};
use crate::framework::registry::TypeRef;
use crate::framework::renderer::{module_providers, Fixture};
use crate::framework::value::Value;
use crate::graph::{GraphMocker, Mocked, SharedCache};
use crate::rendering::Rendering;
use crate::setup::{self, Stubs, TestSetup};

/// Options consumed by `render_with`/`render_template_with`.
pub struct RenderOptions {
    /// Run change detection after instantiation.
    pub detect_changes: bool,
    /// Drain scheduled tasks (and re-detect) after the initial pass.
    pub when_stable: bool,
    /// Property bindings for the unit under test.
    pub bind: Stubs,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            detect_changes: true,
            when_stable: true,
            bind: Stubs::new(),
        }
    }
}

impl RenderOptions {
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bind.set(name, value);
        self
    }

    pub fn detect_changes(mut self, on: bool) -> Self {
        self.detect_changes = on;
        self
    }

    pub fn when_stable(mut self, on: bool) -> Self {
        self.when_stable = on;
        self
    }
}

pub struct Shallow {
    setup: TestSetup,
}

impl Shallow {
    /// A scenario testing `unit` as declared by `module`. Everything else the
    /// module pulls in gets mocked.
    pub fn new(unit: &TypeRef, module: &TypeRef) -> Shallow {
        Shallow {
            setup: TestSetup::new(unit.clone(), Some(module.clone())),
        }
    }

    /// A scenario testing `unit` without an owning module.
    pub fn standalone(unit: &TypeRef) -> Shallow {
        Shallow {
            setup: TestSetup::new(unit.clone(), None),
        }
    }

    // Process-wide registrations. Additive; `reset_globals` is the only
    // removal operation.

    /// Exempts `unit` from mocking in every setup created afterwards.
    pub fn never_mock(unit: &TypeRef) {
        setup::with_globals(|globals| globals.never_mock.push(unit.identity()));
    }

    pub fn never_mock_token(token: &InjectionToken) {
        setup::with_globals(|globals| globals.never_mock.push(Token::from(token).identity()));
    }

    /// Registers default stubs applied whenever `unit` gets mocked. Repeated
    /// registrations merge key-by-key, later wins.
    pub fn always_mock(unit: &TypeRef, stubs: Stubs) {
        setup::with_globals(|globals| globals.register_always_mock(unit.identity(), stubs));
    }

    pub fn always_provide(provider: impl Into<ProviderEntry>) {
        let entry = provider.into();
        setup::with_globals(|globals| globals.always_provide.push(entry));
    }

    pub fn always_import(module: &TypeRef) {
        setup::with_globals(|globals| globals.always_import.push(module.clone()));
    }

    /// Clears every process-wide registration.
    pub fn reset_globals() {
        setup::reset_globals();
    }

    // Per-scenario configuration.

    /// Exempts `unit` from mocking in this scenario.
    pub fn dont_mock(mut self, unit: &TypeRef) -> Self {
        self.setup.dont_mock.insert(unit.identity());
        self
    }

    pub fn dont_mock_token(mut self, token: &InjectionToken) -> Self {
        self.setup.dont_mock.insert(Token::from(token).identity());
        self
    }

    /// Stubs merged into the mock generated for `unit`. Repeated calls for
    /// the same reference merge key-by-key, later wins; global `always_mock`
    /// stubs sit underneath and are never mutated.
    pub fn mock(mut self, unit: &TypeRef, stubs: Stubs) -> Self {
        self.setup.merge_mock(unit.identity(), stubs);
        self
    }

    /// Stubs for a provider registered under an opaque token.
    pub fn mock_token(mut self, token: &InjectionToken, stubs: Stubs) -> Self {
        self.setup.merge_mock(Token::from(token).identity(), stubs);
        self
    }

    /// Replaces the default undefined-returning transform of `pipe`'s mock.
    pub fn mock_pipe(
        mut self,
        pipe: &TypeRef,
        transform: impl Fn(&[Value]) -> Value + 'static,
    ) -> Self {
        self.setup
            .pipe_transforms
            .insert(pipe.identity(), Rc::new(transform));
        self
    }

    /// Patches static members of `target` in place for this scenario. Every
    /// stub must replace an existing function member.
    pub fn mock_static(mut self, target: &TypeRef, stubs: Stubs) -> Self {
        self.setup.static_mocks.push((target.clone(), stubs));
        self
    }

    /// Swaps `original` for `replacement` wherever the graph imports it.
    /// A module-with-providers envelope matches through its inner module.
    pub fn replace_module(mut self, original: &TypeRef, replacement: &TypeRef) -> Self {
        self.setup
            .module_replacements
            .insert(original.identity(), replacement.clone());
        self
    }

    /// A provider added to the assembled module as-is.
    pub fn provide(mut self, provider: impl Into<ProviderEntry>) -> Self {
        self.setup.providers.push(provider.into());
        self
    }

    /// A provider run through the provider mocker before being added.
    pub fn provide_mock(mut self, provide: Provide) -> Self {
        self.setup.mock_providers.push(provide);
        self
    }

    /// Declares an extra unit on top of the owning module's declarations.
    pub fn declare(mut self, unit: &TypeRef) -> Self {
        self.setup.declarations.push(unit.clone());
        self
    }

    /// An extra module imported into the assembled module, unmocked.
    pub fn import(mut self, module: &TypeRef) -> Self {
        self.setup.imports.push(module.clone());
        self
    }

    /// Configures the mock of a structural directive to start with its
    /// embedded content rendered.
    pub fn with_structural_directive(mut self, directive: &TypeRef, render_contents: bool) -> Self {
        self.setup
            .structural_auto_render
            .insert(directive.identity(), render_contents);
        self
    }

    // Terminal operations.

    /// Renders the unit under test bare, with default options.
    pub fn render(self) -> Result<Rendering> {
        self.do_render(ContainerSpec::Bare, RenderOptions::default())
    }

    pub fn render_with(self, options: RenderOptions) -> Result<Rendering> {
        self.do_render(ContainerSpec::Bare, options)
    }

    /// Renders a custom template wrapping the unit under test.
    pub fn render_template(self, template: impl Into<String>) -> Result<Rendering> {
        self.do_render(
            ContainerSpec::Template(template.into()),
            RenderOptions::default(),
        )
    }

    pub fn render_template_with(
        self,
        template: impl Into<String>,
        options: RenderOptions,
    ) -> Result<Rendering> {
        self.do_render(ContainerSpec::Template(template.into()), options)
    }

    fn do_render(self, container: ContainerSpec, options: RenderOptions) -> Result<Rendering> {
        let unit = self.setup.test_unit.clone();
        let assembled = assembler::assemble(&self.setup, container, &options.bind)?;
        let fixture = Fixture::create(&assembled.module, &assembled.root)?;

        let (instance, element) = if assembled.bare {
            (fixture.root_instance(), fixture.root())
        } else {
            let resolved = resolve_mock(&assembled.cache, &unit);
            let mut found = fixture.instances_of(&resolved);
            if found.is_empty() {
                return Err(ShallowError::NoMatches {
                    query: unit.name().to_string(),
                });
            }
            let (instance, element) = found.remove(0);
            (instance, element.unwrap_or_else(|| fixture.root()))
        };

        match assembled.bind_target {
            BindTarget::Root => fixture.bind_root(assembled.bound.clone()),
            BindTarget::Unit => fixture.bind_instance(instance.clone(), assembled.bound.clone()),
        }

        if options.detect_changes {
            fixture.detect_changes()?;
        }
        if options.when_stable {
            fixture.when_stable();
            if options.detect_changes {
                fixture.detect_changes()?;
            }
        }

        Ok(Rendering::new(
            instance,
            element,
            fixture,
            options.bind,
            unit,
            assembled.cache,
        ))
    }

    /// Resolves the unit under test as a service, with the owning module's
    /// provider graph mocked. No rendering happens.
    pub fn create_service(self) -> Result<Value> {
        let cache: SharedCache = Rc::new(RefCell::new(MockCache::new()));
        let mocker = GraphMocker::new(&self.setup, cache.clone());
        let unit = self.setup.test_unit.clone();

        // The unit provides itself unless a later module provider overrides.
        let mut providers = vec![ProviderEntry::from(&unit)];
        if let Some(module) = &self.setup.test_module {
            let mocked = mocker.mock_type(module)?;
            providers.extend(module_providers(&mocked)?);
        }
        for provide in &self.setup.mock_providers {
            providers.push(ProviderEntry::Provide(mocker.mock_provide(provide)?));
        }
        providers.extend(self.setup.providers.iter().cloned());

        Injector::new(&providers).get_type(&unit)
    }
}

fn resolve_mock(cache: &SharedCache, unit: &TypeRef) -> TypeRef {
    match cache.borrow().find(unit.identity()) {
        Some(Mocked::Type(mock)) => mock,
        _ => unit.clone(),
    }
}
