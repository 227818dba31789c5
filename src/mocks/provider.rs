//! Provider mocks.
//!
//! Any provider shape becomes a value provider for the same token whose
//! resolved value is a stub record: stub functions are recorded callables,
//! stub non-functions plain properties, and a `mock_of` back-reference is
//! kept for introspection. Existing-alias providers pass through unmodified;
//! substituting a stub there would break resolution chains that rely on the
//! alias.

use crate::framework::provider::{Provide, Token};
use crate::framework::value::{Obj, Value};
use crate::setup::Stubs;

/// Introspection key on mocked provider values.
pub const MOCK_OF_KEY: &str = "mock_of";

pub fn mock_provide(provide: &Provide, stubs: Option<&Stubs>) -> Provide {
    if let Provide::Existing { .. } = provide {
        return provide.clone();
    }
    let token = provide.token();
    let stub = Obj::new();
    stub.set(
        MOCK_OF_KEY,
        match &token {
            Token::Type(t) => Value::Type(t.clone()),
            Token::Opaque(t) => Value::Str(t.name().to_string()),
        },
    );
    if let Some(stubs) = stubs {
        for (name, value) in stubs.iter() {
            match value {
                Value::Func(f) => stub.set(name.clone(), Value::Func(f.ensure_recorded())),
                other => stub.set(name.clone(), other.clone()),
            }
        }
    }
    Provide::TokenValue {
        token,
        value: Value::Obj(stub),
    }
}
