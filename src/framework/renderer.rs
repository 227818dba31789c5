//! The miniature host renderer.
//!
//! Accepts an assembled module definition plus a root component and produces a
//! live tree of `DebugElement`s. Change detection re-applies property bindings
//! and re-evaluates interpolations; structural content materializes only while
//! its directive instance's contents-rendered flag is set, which is how a
//! mocked structural directive keeps its embedded template dark until a test
//! asks for it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Result, ShallowError};
use crate::framework::injector::Injector;
use crate::framework::provider::{InjectionToken, ModuleImport, Provide, ProviderEntry};
use crate::framework::registry::{TypeMeta, TypeRef};
use crate::framework::template::{
    self, ElementNode, Expr, PipeLookup, TextPart,
};
use crate::framework::value::{Emitter, Func, Obj, Value};

/// Instance key controlling whether structural content is materialized.
pub const CONTENTS_RENDERED_KEY: &str = "__contentsRendered";

thread_local! {
    static SCHEDULER_TOKEN: InjectionToken = InjectionToken::new("Scheduler");
}

/// Token for the fixture's task scheduler. Components may inject it and
/// `schedule` callables that run when the fixture is awaited stable.
pub fn scheduler_token() -> InjectionToken {
    SCHEDULER_TOKEN.with(InjectionToken::clone)
}

type TaskQueue = Rc<RefCell<Vec<Func>>>;

/// Declarations, pipes and the injector shared by every view of one fixture.
pub struct RenderScope {
    directives: Vec<TypeRef>,
    pipes: HashMap<String, TypeRef>,
    injector: Injector,
    tasks: TaskQueue,
}

impl PipeLookup for RenderScope {
    fn pipe_by_name(&self, name: &str) -> Option<TypeRef> {
        self.pipes.get(name).cloned()
    }
}

impl RenderScope {
    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}

#[derive(Clone)]
pub enum DebugNode {
    Element(DebugElement),
    Text(TextView),
    Embedded(EmbeddedView),
}

#[derive(Clone)]
pub struct TextView {
    inner: Rc<TextData>,
}

struct TextData {
    parts: Vec<TextPart>,
    ctx: Obj,
    rendered: RefCell<String>,
}

impl TextView {
    pub fn text(&self) -> String {
        self.inner.rendered.borrow().clone()
    }
}

/// A component instance attached to an element, together with its own view.
pub struct ComponentView {
    pub type_ref: TypeRef,
    pub instance: Obj,
    nodes: Vec<DebugNode>,
}

pub struct ElementData {
    tag: String,
    static_attrs: Vec<(String, String)>,
    bindings: Vec<(String, Expr)>,
    evaluated_attrs: RefCell<IndexMap<String, String>>,
    component: Option<ComponentView>,
    directives: Vec<(TypeRef, Obj)>,
    children: Vec<DebugNode>,
    ctx: Obj,
}

/// A handle to one rendered element.
#[derive(Clone)]
pub struct DebugElement {
    inner: Rc<ElementData>,
}

impl DebugElement {
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.inner.evaluated_attrs.borrow().get(name).cloned()
    }

    pub fn component_type(&self) -> Option<TypeRef> {
        self.inner.component.as_ref().map(|c| c.type_ref.clone())
    }

    pub fn component_instance(&self) -> Option<Obj> {
        self.inner.component.as_ref().map(|c| c.instance.clone())
    }

    pub fn directive_instances(&self) -> Vec<(TypeRef, Obj)> {
        self.inner.directives.clone()
    }

    /// Rendered text of the subtree. A component-bearing element renders its
    /// component's view; a plain element renders its children.
    pub fn text(&self) -> String {
        match &self.inner.component {
            Some(view) => nodes_text(&view.nodes),
            None => nodes_text(&self.inner.children),
        }
    }

    /// The element described as a selector target (tag, classes, attributes).
    pub fn as_selector_target(&self) -> crate::selector::CssSelector {
        let mut desc = crate::selector::CssSelector::new();
        desc.set_element(&self.inner.tag);
        for (name, value) in self.inner.static_attrs.iter() {
            if name == "class" {
                for class in value.split_whitespace() {
                    desc.add_class_name(class);
                }
            } else {
                desc.add_attribute(name, value);
            }
        }
        for (name, value) in self.inner.evaluated_attrs.borrow().iter() {
            if name != "class" && !self.inner.static_attrs.iter().any(|(n, _)| n == name) {
                desc.add_attribute(name, value);
            }
        }
        for (name, _) in &self.inner.bindings {
            if !desc.attrs.iter().any(|(n, _)| n == name) {
                desc.add_attribute(name, "");
            }
        }
        desc
    }
}

struct EmbeddedData {
    directive: TypeRef,
    instance: Obj,
    attr_name: String,
    expr: Option<Expr>,
    template: ElementNode,
    ctx: Obj,
    content: RefCell<Option<DebugNode>>,
    scope: Rc<RenderScope>,
}

/// A structural-directive slot: holds the directive instance and its
/// unmaterialized template.
#[derive(Clone)]
pub struct EmbeddedView {
    inner: Rc<EmbeddedData>,
}

impl EmbeddedView {
    pub fn directive(&self) -> TypeRef {
        self.inner.directive.clone()
    }

    pub fn instance(&self) -> Obj {
        self.inner.instance.clone()
    }
}

/// True when the instance's contents-rendered flag is set.
pub fn contents_rendered(instance: &Obj) -> bool {
    matches!(instance.get(CONTENTS_RENDERED_KEY), Some(Value::Bool(true)))
}

pub struct Fixture {
    root: DebugElement,
    root_instance: Obj,
    root_bindings: RefCell<Vec<(String, Value)>>,
    instance_bindings: RefCell<Vec<(Obj, Vec<(String, Value)>)>>,
    scope: Rc<RenderScope>,
}

impl Fixture {
    /// Instantiates `root` inside `module`'s declaration scope.
    pub fn create(module: &TypeRef, root: &TypeRef) -> Result<Fixture> {
        let scope = Rc::new(build_scope(module)?);
        let root_view = instantiate_component(root, &scope)?;
        let tag = root_tag(root);
        let root_instance = root_view.instance.clone();
        let root_element = DebugElement {
            inner: Rc::new(ElementData {
                tag,
                static_attrs: Vec::new(),
                bindings: Vec::new(),
                evaluated_attrs: RefCell::new(IndexMap::new()),
                component: Some(root_view),
                directives: Vec::new(),
                children: Vec::new(),
                ctx: root_instance.clone(),
            }),
        };
        Ok(Fixture {
            root: root_element,
            root_instance,
            root_bindings: RefCell::new(Vec::new()),
            instance_bindings: RefCell::new(Vec::new()),
            scope,
        })
    }

    /// Bindings applied to the root instance on every change-detection pass.
    pub fn bind_root(&self, bindings: Vec<(String, Value)>) {
        *self.root_bindings.borrow_mut() = bindings;
    }

    /// Bindings applied to a specific instance on every change-detection
    /// pass. Used for a directive under test, whose generated host element
    /// carries no template bindings to route them through.
    pub fn bind_instance(&self, instance: Obj, bindings: Vec<(String, Value)>) {
        self.instance_bindings.borrow_mut().push((instance, bindings));
    }

    pub fn root(&self) -> DebugElement {
        self.root.clone()
    }

    pub fn root_instance(&self) -> Obj {
        self.root_instance.clone()
    }

    pub fn injector(&self) -> &Injector {
        self.scope.injector()
    }

    /// One change-detection pass over the whole tree.
    pub fn detect_changes(&self) -> Result<()> {
        for (property, value) in self.root_bindings.borrow().iter() {
            self.root_instance.set(property.clone(), value.clone());
        }
        for (instance, bindings) in self.instance_bindings.borrow().iter() {
            for (property, value) in bindings {
                instance.set(property.clone(), value.clone());
            }
        }
        detect_element(&self.root, &self.scope)
    }

    /// Drains the fixture's pending task queue (the "wait until stable" pass).
    pub fn when_stable(&self) {
        loop {
            let task = self.scope.tasks.borrow_mut().pop();
            match task {
                Some(func) => {
                    func.call(&[]);
                }
                None => break,
            }
        }
    }

    /// Reconciles structural slots with their instances' contents-rendered
    /// flags: materializes newly enabled content, drops cleared content.
    /// Queries call this so `render_contents()` takes effect without a full
    /// change-detection pass.
    pub fn sync_structural_views(&self) -> Result<()> {
        sync_node(&DebugNode::Element(self.root.clone()), &self.scope)
    }

    /// Every materialized element, root included, in document order.
    pub fn elements(&self) -> Vec<DebugElement> {
        let mut out = Vec::new();
        collect_elements(&DebugNode::Element(self.root.clone()), &mut out);
        out
    }

    /// Every live instance of `target` (component or directive), including
    /// structural-directive instances whose content is not materialized.
    pub fn instances_of(&self, target: &TypeRef) -> Vec<(Obj, Option<DebugElement>)> {
        let mut out = Vec::new();
        collect_instances(&DebugNode::Element(self.root.clone()), target, &mut out);
        out
    }
}

/// Transitive providers of a module, in collection order. Used when a test
/// resolves a service without rendering anything.
pub fn module_providers(module: &TypeRef) -> Result<Vec<ProviderEntry>> {
    let mut directives = Vec::new();
    let mut pipes = HashMap::new();
    let mut providers = Vec::new();
    let mut seen = HashSet::new();
    collect_module(module, &mut directives, &mut pipes, &mut providers, &mut seen)?;
    Ok(providers)
}

fn root_tag(root: &TypeRef) -> String {
    if let TypeMeta::Directive(meta) = root.meta() {
        if let Some(selector) = &meta.selector {
            if let Ok(parsed) = crate::selector::CssSelector::parse(selector) {
                if let Some(first) = parsed.first() {
                    if first.is_element_selector() {
                        return first.element.clone().unwrap();
                    }
                }
            }
        }
    }
    "test-root".to_string()
}

fn build_scope(module: &TypeRef) -> Result<RenderScope> {
    let mut directives = Vec::new();
    let mut pipes = HashMap::new();
    let mut providers: Vec<ProviderEntry> = Vec::new();
    let mut seen = HashSet::new();
    collect_module(module, &mut directives, &mut pipes, &mut providers, &mut seen)?;

    let tasks: TaskQueue = Rc::new(RefCell::new(Vec::new()));
    let queue = tasks.clone();
    let scheduler = Obj::new();
    scheduler.set(
        "schedule",
        Value::Func(Func::new(move |args| {
            if let Some(Value::Func(task)) = args.first() {
                queue.borrow_mut().push(task.clone());
            }
            Value::Undefined
        })),
    );
    providers.push(ProviderEntry::Provide(Provide::value(
        &scheduler_token(),
        Value::Obj(scheduler),
    )));

    Ok(RenderScope {
        directives,
        pipes,
        injector: Injector::new(&providers),
        tasks,
    })
}

fn collect_module(
    module: &TypeRef,
    directives: &mut Vec<TypeRef>,
    pipes: &mut HashMap<String, TypeRef>,
    providers: &mut Vec<ProviderEntry>,
    seen: &mut HashSet<TypeRef>,
) -> Result<()> {
    if !seen.insert(module.clone()) {
        return Ok(());
    }
    let meta = match module.meta() {
        TypeMeta::Module(meta) => meta,
        _ => {
            return Err(ShallowError::InvalidModule {
                name: module.name().to_string(),
            })
        }
    };
    for declaration in &meta.declarations {
        match declaration.meta() {
            TypeMeta::Directive(_) => directives.push(declaration.clone()),
            TypeMeta::Pipe(pipe_meta) => {
                pipes.insert(pipe_meta.pipe_name.clone(), declaration.clone());
            }
            _ => {}
        }
    }
    providers.extend(meta.providers.iter().cloned());
    for import in &meta.imports {
        collect_import(import, directives, pipes, providers, seen)?;
    }
    Ok(())
}

fn collect_import(
    import: &ModuleImport,
    directives: &mut Vec<TypeRef>,
    pipes: &mut HashMap<String, TypeRef>,
    providers: &mut Vec<ProviderEntry>,
    seen: &mut HashSet<TypeRef>,
) -> Result<()> {
    match import {
        ModuleImport::Module(module) => {
            collect_module(module, directives, pipes, providers, seen)
        }
        ModuleImport::WithProviders(envelope) => {
            collect_module(&envelope.module, directives, pipes, providers, seen)?;
            providers.extend(envelope.providers.iter().cloned());
            Ok(())
        }
        ModuleImport::List(list) => {
            for inner in list.iter() {
                collect_import(inner, directives, pipes, providers, seen)?;
            }
            Ok(())
        }
    }
}

fn instantiate_component(type_ref: &TypeRef, scope: &Rc<RenderScope>) -> Result<ComponentView> {
    let meta = match type_ref.meta() {
        TypeMeta::Directive(meta) if meta.template.is_some() => meta.clone(),
        _ => {
            return Err(ShallowError::NotMockable {
                name: type_ref.name().to_string(),
            })
        }
    };
    let instance = Obj::new();
    if let Some(construct) = &meta.construct {
        construct(scope.injector(), &instance);
    }
    ensure_output_emitters(&instance, type_ref);
    let template_src = meta.template.as_deref().unwrap_or("");
    let parsed = template::parse_template(template_src)?;
    let nodes = build_nodes(&parsed, &instance, scope)?;
    Ok(ComponentView {
        type_ref: type_ref.clone(),
        instance,
        nodes,
    })
}

fn instantiate_directive(type_ref: &TypeRef, scope: &Rc<RenderScope>) -> Obj {
    let instance = Obj::new();
    if let TypeMeta::Directive(meta) = type_ref.meta() {
        if let Some(construct) = &meta.construct {
            construct(scope.injector(), &instance);
        }
    }
    ensure_output_emitters(&instance, type_ref);
    instance
}

/// Every declared output gets an emitter if the constructor didn't set one.
fn ensure_output_emitters(instance: &Obj, type_ref: &TypeRef) {
    if let TypeMeta::Directive(meta) = type_ref.meta() {
        for output in &meta.outputs {
            if instance.get(&output.property).is_none() {
                instance.set(output.property.clone(), Value::Emitter(Emitter::new()));
            }
        }
    }
}

fn build_nodes(
    nodes: &[template::Node],
    ctx: &Obj,
    scope: &Rc<RenderScope>,
) -> Result<Vec<DebugNode>> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            template::Node::Text(parts) => out.push(DebugNode::Text(TextView {
                inner: Rc::new(TextData {
                    parts: parts.clone(),
                    ctx: ctx.clone(),
                    rendered: RefCell::new(String::new()),
                }),
            })),
            template::Node::Element(element) => {
                out.push(build_element(element, ctx, scope)?);
            }
        }
    }
    Ok(out)
}

fn element_selector_target(element: &ElementNode) -> crate::selector::CssSelector {
    let mut desc = crate::selector::CssSelector::new();
    desc.set_element(&element.tag);
    for (name, value) in &element.attrs {
        if name == "class" {
            for class in value.split_whitespace() {
                desc.add_class_name(class);
            }
        } else {
            desc.add_attribute(name, value);
        }
    }
    for (name, _) in &element.inputs {
        desc.add_attribute(name, "");
    }
    for (name, _) in &element.outputs {
        desc.add_attribute(name, "");
    }
    if let Some((name, _)) = &element.structural {
        desc.add_attribute(name, "");
    }
    desc
}

fn is_component(type_ref: &TypeRef) -> bool {
    matches!(type_ref.meta(), TypeMeta::Directive(meta) if meta.template.is_some())
}

fn build_element(
    element: &ElementNode,
    ctx: &Obj,
    scope: &Rc<RenderScope>,
) -> Result<DebugNode> {
    let desc = element_selector_target(element);

    if let Some((attr_name, expr)) = &element.structural {
        let directive = scope
            .directives
            .iter()
            .filter(|d| !is_component(d))
            .find(|d| directive_matches(d, &desc))
            .cloned()
            .ok_or_else(|| {
                ShallowError::TemplateParse(format!(
                    "no declared directive matches *{attr_name}"
                ))
            })?;
        let instance = instantiate_directive(&directive, scope);
        // Real structural directives materialize by default; mocks set the
        // flag themselves during construction.
        if instance.get(CONTENTS_RENDERED_KEY).is_none() {
            instance.set(CONTENTS_RENDERED_KEY, Value::Bool(true));
        }
        let mut inner_template = element.clone();
        inner_template.structural = None;
        return Ok(DebugNode::Embedded(EmbeddedView {
            inner: Rc::new(EmbeddedData {
                directive,
                instance,
                attr_name: attr_name.clone(),
                expr: expr.clone(),
                template: inner_template,
                ctx: ctx.clone(),
                content: RefCell::new(None),
                scope: scope.clone(),
            }),
        }));
    }

    let component_type = scope
        .directives
        .iter()
        .filter(|d| is_component(d))
        .find(|d| directive_matches(d, &desc))
        .cloned();
    let directive_types: Vec<TypeRef> = scope
        .directives
        .iter()
        .filter(|d| !is_component(d))
        .filter(|d| directive_matches(d, &desc))
        .cloned()
        .collect();

    let component = match &component_type {
        Some(type_ref) => Some(instantiate_component(type_ref, scope)?),
        None => None,
    };
    let directives: Vec<(TypeRef, Obj)> = directive_types
        .into_iter()
        .map(|d| {
            let instance = instantiate_directive(&d, scope);
            (d, instance)
        })
        .collect();

    // Wire template listeners to matching output emitters.
    for (event_name, handler) in &element.outputs {
        let mut targets: Vec<(Obj, String)> = Vec::new();
        if let Some(view) = &component {
            if let Some(binding) = output_binding(&view.type_ref, event_name) {
                targets.push((view.instance.clone(), binding));
            }
        }
        for (directive, instance) in &directives {
            if let Some(binding) = output_binding(directive, event_name) {
                targets.push((instance.clone(), binding));
            }
        }
        for (instance, property) in targets {
            if let Some(Value::Emitter(emitter)) = instance.get(&property) {
                let handler = handler.clone();
                let handler_ctx = ctx.clone();
                let handler_scope = scope.clone();
                emitter.subscribe(move |event| {
                    let _ = template::evaluate(
                        &handler,
                        &handler_ctx,
                        Some(event),
                        handler_scope.as_ref(),
                    );
                });
            }
        }
    }

    // Content of a component-bearing element is not projected; plain elements
    // render their children.
    let children = if component.is_some() {
        Vec::new()
    } else {
        build_nodes(&element.children, ctx, scope)?
    };

    Ok(DebugNode::Element(DebugElement {
        inner: Rc::new(ElementData {
            tag: element.tag.clone(),
            static_attrs: element.attrs.clone(),
            bindings: element.inputs.clone(),
            evaluated_attrs: RefCell::new(
                element.attrs.iter().cloned().collect::<IndexMap<_, _>>(),
            ),
            component,
            directives,
            children,
            ctx: ctx.clone(),
        }),
    }))
}

fn directive_matches(directive: &TypeRef, desc: &crate::selector::CssSelector) -> bool {
    if let TypeMeta::Directive(meta) = directive.meta() {
        if let Some(selector) = &meta.selector {
            return crate::selector::matches_selector(selector, desc).unwrap_or(false);
        }
    }
    false
}

fn output_binding(type_ref: &TypeRef, public_name: &str) -> Option<String> {
    if let TypeMeta::Directive(meta) = type_ref.meta() {
        for output in &meta.outputs {
            if output.matches(public_name) {
                return Some(output.property.clone());
            }
        }
    }
    None
}

fn input_binding(type_ref: &TypeRef, public_name: &str) -> Option<String> {
    if let TypeMeta::Directive(meta) = type_ref.meta() {
        for input in &meta.inputs {
            if input.matches(public_name) {
                return Some(input.property.clone());
            }
        }
    }
    None
}

fn detect_element(element: &DebugElement, scope: &Rc<RenderScope>) -> Result<()> {
    let data = &element.inner;
    for (name, expr) in &data.bindings {
        let value = template::evaluate(expr, &data.ctx, None, scope.as_ref())?;
        let mut routed = false;
        if let Some(view) = &data.component {
            if let Some(property) = input_binding(&view.type_ref, name) {
                view.instance.set(property, value.clone());
                routed = true;
            }
        }
        for (directive, instance) in &data.directives {
            if let Some(property) = input_binding(directive, name) {
                instance.set(property, value.clone());
                routed = true;
            }
        }
        if !routed {
            data.evaluated_attrs
                .borrow_mut()
                .insert(name.clone(), value.render());
        }
    }
    if let Some(view) = &data.component {
        for node in &view.nodes {
            detect_node(node, scope)?;
        }
    }
    for node in &data.children {
        detect_node(node, scope)?;
    }
    Ok(())
}

fn detect_node(node: &DebugNode, scope: &Rc<RenderScope>) -> Result<()> {
    match node {
        DebugNode::Element(element) => detect_element(element, scope),
        DebugNode::Text(text) => {
            let mut rendered = String::new();
            for part in &text.inner.parts {
                match part {
                    TextPart::Literal(s) => rendered.push_str(s),
                    TextPart::Interpolation(expr) => {
                        let value =
                            template::evaluate(expr, &text.inner.ctx, None, scope.as_ref())?;
                        rendered.push_str(&value.render());
                    }
                }
            }
            *text.inner.rendered.borrow_mut() = rendered;
            Ok(())
        }
        DebugNode::Embedded(view) => detect_embedded(view, scope),
    }
}

fn detect_embedded(view: &EmbeddedView, scope: &Rc<RenderScope>) -> Result<()> {
    let data = &view.inner;
    if let Some(expr) = &data.expr {
        let value = template::evaluate(expr, &data.ctx, None, scope.as_ref())?;
        let property =
            input_binding(&data.directive, &data.attr_name).unwrap_or_else(|| data.attr_name.clone());
        data.instance.set(property, value);
    }
    if contents_rendered(&data.instance) {
        if data.content.borrow().is_none() {
            let built = build_element(&data.template, &data.ctx, &data.scope)?;
            *data.content.borrow_mut() = Some(built);
        }
        let content = data.content.borrow().clone();
        if let Some(content) = content {
            detect_node(&content, scope)?;
        }
    } else {
        *data.content.borrow_mut() = None;
    }
    Ok(())
}

fn sync_node(node: &DebugNode, scope: &Rc<RenderScope>) -> Result<()> {
    match node {
        DebugNode::Element(element) => {
            if let Some(view) = &element.inner.component {
                for child in &view.nodes {
                    sync_node(child, scope)?;
                }
            }
            for child in &element.inner.children {
                sync_node(child, scope)?;
            }
            Ok(())
        }
        DebugNode::Text(_) => Ok(()),
        DebugNode::Embedded(view) => {
            let data = &view.inner;
            if contents_rendered(&data.instance) {
                if data.content.borrow().is_none() {
                    let built = build_element(&data.template, &data.ctx, &data.scope)?;
                    detect_node(&built, scope)?;
                    *data.content.borrow_mut() = Some(built);
                }
            } else {
                *data.content.borrow_mut() = None;
            }
            let content = data.content.borrow().clone();
            if let Some(content) = content {
                sync_node(&content, scope)?;
            }
            Ok(())
        }
    }
}

fn nodes_text(nodes: &[DebugNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            DebugNode::Element(element) => out.push_str(&element.text()),
            DebugNode::Text(text) => out.push_str(&text.text()),
            DebugNode::Embedded(view) => {
                if let Some(content) = view.inner.content.borrow().as_ref() {
                    out.push_str(&node_text(content));
                }
            }
        }
    }
    out
}

fn node_text(node: &DebugNode) -> String {
    match node {
        DebugNode::Element(element) => element.text(),
        DebugNode::Text(text) => text.text(),
        DebugNode::Embedded(view) => match view.inner.content.borrow().as_ref() {
            Some(content) => node_text(content),
            None => String::new(),
        },
    }
}

fn collect_elements(node: &DebugNode, out: &mut Vec<DebugElement>) {
    match node {
        DebugNode::Element(element) => {
            out.push(element.clone());
            if let Some(view) = &element.inner.component {
                for child in &view.nodes {
                    collect_elements(child, out);
                }
            }
            for child in &element.inner.children {
                collect_elements(child, out);
            }
        }
        DebugNode::Text(_) => {}
        DebugNode::Embedded(view) => {
            if let Some(content) = view.inner.content.borrow().as_ref() {
                collect_elements(content, out);
            }
        }
    }
}

fn collect_instances(
    node: &DebugNode,
    target: &TypeRef,
    out: &mut Vec<(Obj, Option<DebugElement>)>,
) {
    match node {
        DebugNode::Element(element) => {
            if let Some(view) = &element.inner.component {
                if view.type_ref == *target {
                    out.push((view.instance.clone(), Some(element.clone())));
                }
            }
            for (directive, instance) in &element.inner.directives {
                if directive == target {
                    out.push((instance.clone(), Some(element.clone())));
                }
            }
            if let Some(view) = &element.inner.component {
                for child in &view.nodes {
                    collect_instances(child, target, out);
                }
            }
            for child in &element.inner.children {
                collect_instances(child, target, out);
            }
        }
        DebugNode::Text(_) => {}
        DebugNode::Embedded(view) => {
            if view.inner.directive == *target {
                out.push((view.instance(), None));
            }
            if let Some(content) = view.inner.content.borrow().as_ref() {
                collect_instances(content, target, out);
            }
        }
    }
}
