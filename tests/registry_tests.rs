use cmdbridge::dispatch::{CommandHandler, HandlerContext, HandlerRegistry};
use cmdbridge::error::{HandlerError, RegistryError};
use serde_json::{Value, json};
use std::sync::Arc;

struct Ping;

#[async_trait::async_trait]
impl CommandHandler for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    async fn execute(&self, _context: HandlerContext) -> Result<Value, HandlerError> {
        Ok(json!({ "pong": true }))
    }
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut builder = HandlerRegistry::builder();
    assert!(builder.register(Ping).is_ok());

    let result = builder.register_fn("ping", |_| async { Ok(Value::Null) });
    assert!(matches!(result, Err(RegistryError::DuplicateHandler(name)) if name == "ping"));

    // The first registration is untouched.
    let registry = builder.build();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_empty_name_is_rejected() {
    let mut builder = HandlerRegistry::builder();
    let result = builder.register_fn("", |_| async { Ok(Value::Null) });
    assert_eq!(result.err(), Some(RegistryError::EmptyName));
}

#[test]
fn test_resolve_returns_the_same_handler_each_time() {
    let mut builder = HandlerRegistry::builder();
    builder.register(Ping).unwrap();
    let registry = builder.build();

    let first = registry.resolve("ping").unwrap();
    let second = registry.resolve("ping").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry.resolve("pong").is_none());
}

#[test]
fn test_list_is_sorted() {
    let mut builder = HandlerRegistry::builder();
    builder
        .register_fn("zeta", |_| async { Ok(Value::Null) })
        .unwrap()
        .register(Ping)
        .unwrap()
        .register_fn("alpha", |_| async { Ok(Value::Null) })
        .unwrap();
    let registry = builder.build();

    assert_eq!(registry.list(), vec!["alpha", "ping", "zeta"]);
    assert!(registry.contains("alpha"));
    assert!(!registry.is_empty());
}
