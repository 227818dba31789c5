//! Pipe mocks: same lookup name, transform replaced by a no-op returning
//! `Undefined` unless the setup registered a custom transform.

use std::rc::Rc;

use crate::error::Result;
use crate::framework::registry::{define_mock, PipeMetadata, TransformFn, TypeMeta, TypeRef};
use crate::framework::value::Value;
use crate::reflect::Reflector;

pub fn mock_pipe(original: &TypeRef, transform: Option<TransformFn>) -> Result<TypeRef> {
    let pipe_name = Reflector::pipe_name(original)?;
    let meta = PipeMetadata {
        pipe_name,
        transform: Some(transform.unwrap_or_else(|| Rc::new(|_| Value::Undefined))),
    };
    Ok(define_mock(
        format!("MockOf{}", original.name()),
        TypeMeta::Pipe(meta),
        original.clone(),
    ))
}
