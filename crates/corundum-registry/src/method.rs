//! Method records and native method bodies.
//!
//! The object model never interprets a method body. Bodies are type-erased
//! Rust closures that receive the object space and an [`Invocation`], so a
//! body can send further messages, call `super` or raise.

use std::fmt;
use std::sync::Arc;

use corundum_core::{Epoch, ModelResult, ObjectModelError, TypeId, Value};
use rustc_hash::FxHashMap;

use crate::ObjectSpace;

/// Signature shared by every native method body.
pub type MethodFn = dyn Fn(&mut ObjectSpace, &Invocation) -> ModelResult<Value> + Send + Sync;

/// Selector -> record table owned by a type or a proxy node.
pub type MethodTable = FxHashMap<Arc<str>, MethodRecord>;

/// Type-erased native method body.
///
/// Cloning shares the underlying callable.
#[derive(Clone)]
pub struct NativeMethod {
    inner: Arc<MethodFn>,
    arity: Option<usize>,
}

impl NativeMethod {
    /// A body accepting any number of arguments.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ObjectSpace, &Invocation) -> ModelResult<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            arity: None,
        }
    }

    /// A body that must be called with exactly `arity` arguments.
    pub fn with_arity<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&mut ObjectSpace, &Invocation) -> ModelResult<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            arity: Some(arity),
        }
    }

    /// A body that ignores its arguments and returns `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_, _| Ok(value.clone()))
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Check the arity and run the body.
    pub fn call(&self, space: &mut ObjectSpace, invocation: &Invocation) -> ModelResult<Value> {
        if let Some(expected) = self.arity {
            if invocation.args.len() != expected {
                return Err(ObjectModelError::ArgumentCount {
                    selector: invocation.selector.to_string(),
                    expected,
                    given: invocation.args.len(),
                });
            }
        }
        (self.inner)(space, invocation)
    }

    /// Whether both handles share one callable.
    pub fn ptr_eq(&self, other: &NativeMethod) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// One running call of a method body.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub receiver: Value,
    /// The selector the caller used.
    pub selector: Arc<str>,
    /// The selector `super` continues with: the aliased original name for an
    /// alias, otherwise the same as `selector`.
    pub method_name: Arc<str>,
    pub args: Vec<Value>,
    /// The type that defines the running method.
    pub owner: TypeId,
    /// Chain index the running method was reached at by `super`, valid for
    /// the recorded epoch. Lets a module mixed in twice continue past the
    /// right copy.
    pub(crate) chain_index: Option<(Epoch, usize)>,
}

impl Invocation {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// The argument at `index`, or an arity error naming this call.
    pub fn expect_arg(&self, index: usize) -> ModelResult<&Value> {
        self.arg(index)
            .ok_or_else(|| ObjectModelError::ArgumentCount {
                selector: self.selector.to_string(),
                expected: index + 1,
                given: self.args.len(),
            })
    }
}

/// What a method record does when invoked.
#[derive(Debug, Clone)]
pub enum MethodBody {
    Native(NativeMethod),
    /// Placeholder that forwards to the unknown-message hook. Never shadows a
    /// real definition further up the chain.
    Stub,
    /// Explicitly undefined: shadows every ancestor and behaves as absent.
    Undefined,
}

/// A method as stored in a type's or proxy's table.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    pub body: MethodBody,
    /// The type that defines this method; `super` continues after it.
    pub owner: TypeId,
    /// Original selector when this record is an alias. Always points at a
    /// non-alias name.
    pub alias_of: Option<Arc<str>>,
}

impl MethodRecord {
    pub fn native(owner: TypeId, method: NativeMethod) -> Self {
        Self {
            body: MethodBody::Native(method),
            owner,
            alias_of: None,
        }
    }

    pub fn stub(owner: TypeId) -> Self {
        Self {
            body: MethodBody::Stub,
            owner,
            alias_of: None,
        }
    }

    pub fn undefined(owner: TypeId) -> Self {
        Self {
            body: MethodBody::Undefined,
            owner,
            alias_of: None,
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.body, MethodBody::Stub)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.body, MethodBody::Undefined)
    }

    pub fn as_native(&self) -> Option<&NativeMethod> {
        match &self.body {
            MethodBody::Native(method) => Some(method),
            _ => None,
        }
    }

    /// Whether invoking this record runs a real body.
    pub fn is_callable(&self) -> bool {
        self.as_native().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kinds() {
        let owner = TypeId::new(1);
        let native = MethodRecord::native(owner, NativeMethod::constant(Value::Nil));
        assert!(native.is_callable());
        assert!(!native.is_stub());

        let stub = MethodRecord::stub(owner);
        assert!(stub.is_stub());
        assert!(!stub.is_callable());

        let undefined = MethodRecord::undefined(owner);
        assert!(undefined.is_undefined());
        assert!(undefined.as_native().is_none());
    }

    #[test]
    fn arity_is_checked_before_the_body_runs() {
        let mut space = ObjectSpace::new();
        let method = NativeMethod::with_arity(1, |_, _| panic!("must not run"));
        let invocation = Invocation {
            receiver: Value::Nil,
            selector: Arc::from("push"),
            method_name: Arc::from("push"),
            args: vec![],
            owner: space.builtins().object,
            chain_index: None,
        };

        let err = method.call(&mut space, &invocation).unwrap_err();
        assert_eq!(
            err,
            ObjectModelError::ArgumentCount {
                selector: "push".into(),
                expected: 1,
                given: 0,
            }
        );
    }

    #[test]
    fn clones_share_the_callable() {
        let method = NativeMethod::constant(Value::Int(1));
        let copy = method.clone();
        assert!(method.ptr_eq(&copy));
        assert!(!method.ptr_eq(&NativeMethod::constant(Value::Int(1))));
    }
}
