//! Component and directive mocks.
//!
//! A mock preserves the original's selector (or gains a synthetic one so it
//! stays addressable), its input/output names and aliases, and its export-as
//! name. Every output on every instance is a fresh emitter; stub functions
//! become recorded callables; non-function stubs become plain properties.
//! Structural mocks expose `render_contents` / `clear_contents` on the
//! instance and keep embedded content dark by default.

use crate::error::Result;
use crate::framework::registry::{define_mock, DirectiveMetadata, TypeMeta, TypeRef};
use crate::framework::renderer::CONTENTS_RENDERED_KEY;
use crate::framework::value::{Emitter, Func, Obj, Value};
use crate::reflect::Reflector;
use crate::setup::Stubs;

/// Instance method toggling structural content on.
pub const RENDER_CONTENTS: &str = "render_contents";
/// Instance method toggling structural content off.
pub const CLEAR_CONTENTS: &str = "clear_contents";

pub fn mock_directive(
    original: &TypeRef,
    stubs: Option<&Stubs>,
    auto_render: bool,
) -> Result<TypeRef> {
    let reflection = Reflector::resolve_directive(original)?;
    let selector = reflection
        .selector
        .clone()
        .unwrap_or_else(|| synthetic_selector(original.name()));

    let outputs = reflection.outputs.clone();
    let stubs = stubs.cloned().unwrap_or_default();
    let structural = reflection.structural;

    let construct_outputs = outputs.clone();
    let construct_stubs = stubs.clone();
    let meta = DirectiveMetadata {
        selector: Some(selector),
        inputs: reflection.inputs.clone(),
        outputs,
        export_as: reflection.export_as.clone(),
        // A component mock keeps an (empty) template so it still counts as a
        // component; it renders nothing.
        template: reflection.template.as_ref().map(|_| String::new()),
        providers: Vec::new(),
        structural,
        construct: Some(std::rc::Rc::new(move |_injector, instance| {
            for output in &construct_outputs {
                instance.set(output.property.clone(), Value::Emitter(Emitter::new()));
            }
            for (name, value) in construct_stubs.iter() {
                match value {
                    Value::Func(f) => {
                        instance.set(name.clone(), Value::Func(f.ensure_recorded()))
                    }
                    other => instance.set(name.clone(), other.clone()),
                }
            }
            if structural {
                install_content_controls(instance, auto_render);
            }
        })),
    };

    Ok(define_mock(
        format!("MockOf{}", original.name()),
        TypeMeta::Directive(meta),
        original.clone(),
    ))
}

fn install_content_controls(instance: &Obj, auto_render: bool) {
    instance.set(CONTENTS_RENDERED_KEY, Value::Bool(auto_render));
    let on_target = instance.clone();
    instance.set(
        RENDER_CONTENTS,
        Value::Func(Func::new(move |_| {
            on_target.set(CONTENTS_RENDERED_KEY, Value::Bool(true));
            Value::Undefined
        })),
    );
    let off_target = instance.clone();
    instance.set(
        CLEAR_CONTENTS,
        Value::Func(Func::new(move |_| {
            off_target.set(CONTENTS_RENDERED_KEY, Value::Bool(false));
            Value::Undefined
        })),
    );
}

/// A private selector for originals that declared none, so generated host
/// templates can still address the mock.
fn synthetic_selector(name: &str) -> String {
    let mut out = String::from("mock-");
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_selectors_are_kebab_cased() {
        assert_eq!(synthetic_selector("MyLabel"), "mock-my-label");
        assert_eq!(synthetic_selector("X"), "mock-x");
    }
}
