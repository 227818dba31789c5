//! The dynamic value universe instances live in.
//!
//! The host framework's components and services are untyped records at
//! runtime; `Value` models that. `Func` carries the abstract "spy" capability:
//! a callable that may record its invocations, consulted by tests instead of a
//! spy framework. `Emitter` is the output-event channel.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::framework::registry::TypeRef;

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Obj(Obj),
    Func(Func),
    Emitter(Emitter),
    Type(TypeRef),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn num(n: f64) -> Value {
        Value::Num(n)
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&Obj> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_emitter(&self) -> Option<&Emitter> {
        match self {
            Value::Emitter(e) => Some(e),
            _ => None,
        }
    }

    /// Renders the value the way an interpolation would.
    pub fn render(&self) -> String {
        match self {
            Value::Undefined => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .borrow()
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
            Value::Obj(_) => "[object]".to_string(),
            Value::Func(_) => "[function]".to_string(),
            Value::Emitter(_) => "[emitter]".to_string(),
            Value::Type(t) => t.name().to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Obj(a), Value::Obj(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Emitter(a), Value::Emitter(b)) => a.ptr_eq(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => write!(f, "{:?}", items.borrow()),
            Value::Obj(o) => write!(f, "Obj({:?})", o.keys()),
            Value::Func(func) => {
                if func.is_recorded() {
                    write!(f, "[recorded fn]")
                } else {
                    write!(f, "[fn]")
                }
            }
            Value::Emitter(_) => write!(f, "[emitter]"),
            Value::Type(t) => write!(f, "Type({})", t.name()),
        }
    }
}

/// A mutable, insertion-ordered record. Cheap to clone (shared handle).
#[derive(Clone, Default)]
pub struct Obj {
    map: Rc<RefCell<IndexMap<String, Value>>>,
}

impl Obj {
    pub fn new() -> Obj {
        Obj::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.borrow().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.map.borrow_mut().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.map.borrow_mut().shift_remove(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.map.borrow().keys().cloned().collect()
    }

    /// Calls the function stored under `key` with `args`. Returns `None` when
    /// the key is absent or does not hold a callable.
    pub fn call(&self, key: &str, args: &[Value]) -> Option<Value> {
        match self.get(key) {
            Some(Value::Func(f)) => Some(f.call(args)),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Rc::ptr_eq(&self.map, &other.map)
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj({:?})", self.keys())
    }
}

type FuncImpl = Box<dyn Fn(&[Value]) -> Value>;

struct FuncInner {
    f: FuncImpl,
    calls: Option<RefCell<Vec<Vec<Value>>>>,
}

/// A callable value, optionally recording every invocation.
#[derive(Clone)]
pub struct Func {
    inner: Rc<FuncInner>,
}

impl Func {
    /// A plain, non-recording callable.
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Func {
        Func {
            inner: Rc::new(FuncInner {
                f: Box::new(f),
                calls: None,
            }),
        }
    }

    /// A callable that records the arguments of every invocation.
    pub fn recorded(f: impl Fn(&[Value]) -> Value + 'static) -> Func {
        Func {
            inner: Rc::new(FuncInner {
                f: Box::new(f),
                calls: Some(RefCell::new(Vec::new())),
            }),
        }
    }

    /// A recording callable that ignores its arguments and returns `value`.
    pub fn recorded_returning(value: Value) -> Func {
        Func::recorded(move |_| value.clone())
    }

    /// Wraps `self` in a recording layer unless it already records.
    pub fn ensure_recorded(&self) -> Func {
        if self.is_recorded() {
            return self.clone();
        }
        let delegate = self.clone();
        Func::recorded(move |args| delegate.call(args))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        if let Some(calls) = &self.inner.calls {
            calls.borrow_mut().push(args.to_vec());
        }
        (self.inner.f)(args)
    }

    pub fn is_recorded(&self) -> bool {
        self.inner.calls.is_some()
    }

    /// The recorded invocations, oldest first. Empty for non-recording funcs.
    pub fn calls(&self) -> Vec<Vec<Value>> {
        match &self.inner.calls {
            Some(calls) => calls.borrow().clone(),
            None => Vec::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        match &self.inner.calls {
            Some(calls) => calls.borrow().len(),
            None => 0,
        }
    }

    pub fn ptr_eq(&self, other: &Func) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

type Subscriber = Box<dyn Fn(&Value)>;

#[derive(Default)]
struct EmitterInner {
    subscribers: RefCell<Vec<Subscriber>>,
    emissions: RefCell<Vec<Value>>,
}

/// An output-event channel. Each mock instance gets a fresh one per output so
/// emissions never cross-contaminate between sibling instances.
#[derive(Clone, Default)]
pub struct Emitter {
    inner: Rc<EmitterInner>,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    pub fn emit(&self, value: Value) {
        self.inner.emissions.borrow_mut().push(value.clone());
        for sub in self.inner.subscribers.borrow().iter() {
            sub(&value);
        }
    }

    pub fn subscribe(&self, f: impl Fn(&Value) + 'static) {
        self.inner.subscribers.borrow_mut().push(Box::new(f));
    }

    /// Everything emitted so far, oldest first.
    pub fn emissions(&self) -> Vec<Value> {
        self.inner.emissions.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Emitter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Emitter({} emissions)", self.inner.emissions.borrow().len())
    }
}
