//! User-defined type registry
//!
//! Type codes 14–15 carry values of classes the core codec does not know.
//! On the wire they are a space-separated `"class_name payload"` string;
//! decoding looks the class name up in a [`TypeRegistry`] populated at
//! program start and hands the payload to the registered constructor.
//! Unknown names are decode errors — there is no dynamic class loading.

use crate::error::{CodecError, Result};
use crate::value::{UserLiteral, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Constructor for a user-defined type: lexical payload in, value out.
pub type UserConstructor = fn(&str) -> Result<Value>;

enum Ctor {
    /// Keep the payload as a [`UserLiteral`] of the registered class.
    Literal,
    /// Parse the payload with a custom function.
    Custom(UserConstructor),
}

/// Registry mapping user class names to constructor functions.
#[derive(Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, Ctor>,
}

impl TypeRegistry {
    /// An empty registry; every user-defined decode fails with
    /// [`CodecError::UnknownUserType`].
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Register a constructor for `class_name`, replacing any previous one.
    pub fn register(&mut self, class_name: impl Into<String>, constructor: UserConstructor) {
        let class_name = class_name.into();
        debug!(class = %class_name, "registered user type constructor");
        self.constructors.insert(class_name, Ctor::Custom(constructor));
    }

    /// Register the pass-through constructor for `class_name`, which keeps
    /// the payload as a [`UserLiteral`] of that class. Round-trips
    /// byte-identically.
    pub fn register_literal(&mut self, class_name: impl Into<String>) {
        let class_name = class_name.into();
        debug!(class = %class_name, "registered pass-through user type");
        self.constructors.insert(class_name, Ctor::Literal);
    }

    /// Whether `class_name` has a registered constructor.
    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    /// Instantiate a value of `class_name` from its lexical payload.
    pub fn construct(&self, class_name: &str, lexical: &str) -> Result<Value> {
        match self.constructors.get(class_name) {
            None => Err(CodecError::UnknownUserType(class_name.to_string())),
            Some(Ctor::Literal) => Ok(Value::User(Box::new(UserLiteral::new(
                class_name, lexical,
            )))),
            Some(Ctor::Custom(ctor)) => ctor(lexical).map_err(|e| match e {
                err @ CodecError::UserConstructor { .. } => err,
                other => CodecError::user_constructor(class_name, other.to_string()),
            }),
        }
    }

    /// The process-wide empty registry used by the plain decode entry
    /// points.
    pub fn shared_empty() -> &'static TypeRegistry {
        static EMPTY: OnceLock<TypeRegistry> = OnceLock::new();
        EMPTY.get_or_init(TypeRegistry::new)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("classes", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_class_is_error() {
        let reg = TypeRegistry::new();
        match reg.construct("com.example.Missing", "x").unwrap_err() {
            CodecError::UnknownUserType(name) => assert_eq!(name, "com.example.Missing"),
            other => panic!("expected UnknownUserType, got {:?}", other),
        }
    }

    #[test]
    fn test_pass_through_literal() {
        let mut reg = TypeRegistry::new();
        reg.register_literal("com.example.Money");
        let v = reg.construct("com.example.Money", "12.50 USD").unwrap();
        assert_eq!(
            v,
            Value::User(Box::new(UserLiteral::new("com.example.Money", "12.50 USD")))
        );
    }

    #[test]
    fn test_custom_constructor() {
        fn parse_flag(lexical: &str) -> Result<Value> {
            match lexical {
                "on" => Ok(Value::Boolean(true)),
                "off" => Ok(Value::Boolean(false)),
                other => Err(CodecError::user_constructor(
                    "com.example.Flag",
                    format!("bad flag: {}", other),
                )),
            }
        }
        let mut reg = TypeRegistry::new();
        reg.register("com.example.Flag", parse_flag);
        assert_eq!(
            reg.construct("com.example.Flag", "on").unwrap(),
            Value::Boolean(true)
        );
        match reg.construct("com.example.Flag", "maybe").unwrap_err() {
            CodecError::UserConstructor { class, .. } => assert_eq!(class, "com.example.Flag"),
            other => panic!("expected UserConstructor, got {:?}", other),
        }
    }

    #[test]
    fn test_shared_empty_rejects_everything() {
        assert!(TypeRegistry::shared_empty()
            .construct("anything", "x")
            .is_err());
    }
}
