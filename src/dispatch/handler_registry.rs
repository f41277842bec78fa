use crate::dispatch::{
    CommandDefinition, CommandHandler, FnCommandHandler, HandlerContext, HandlerFn,
    HandlerFuture, ValidatorFn,
};
use crate::envelope::RpcParams;
use crate::error::{HandlerError, RegistryError, ValidationFailure};
use serde_json::Value;
use std::collections::{BTreeMap, btree_map::Entry};
use std::{future::Future, sync::Arc};

/// Collects handlers during startup.
///
/// Duplicate names are refused here, before anything can be dispatched.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H) -> Result<&mut Self, RegistryError>
    where
        H: CommandHandler + 'static,
    {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(
        &mut self,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let name = handler.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        match self.handlers.entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateHandler(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!("Registered handler `{}`", entry.key());
                entry.insert(handler);
                Ok(self)
            }
        }
    }

    /// Registers an async closure with no parameter validator.
    pub fn register_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register(FnCommandHandler::new(name, None, wrap_executor(handler)))
    }

    /// Registers an async closure guarded by `validator`.
    pub fn register_fn_with_validator<V, F, Fut>(
        &mut self,
        name: impl Into<String>,
        validator: V,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        V: Fn(&RpcParams) -> Result<(), ValidationFailure> + Send + Sync + 'static,
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let validator: ValidatorFn = Arc::new(validator);
        self.register(FnCommandHandler::new(
            name,
            Some(validator),
            wrap_executor(handler),
        ))
    }

    /// Registers a typed handler for `C`.
    ///
    /// The validator is `C::decode_params`, so a parameter bag that does not
    /// deserialize into `C::Params` never reaches `handler`.
    pub fn register_command<C, F, Fut>(&mut self, handler: F) -> Result<&mut Self, RegistryError>
    where
        C: CommandDefinition + 'static,
        F: Fn(HandlerContext, C::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C::Output, HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let executor: HandlerFn = Arc::new(move |context: HandlerContext| {
            let handler = handler.clone();
            Box::pin(async move {
                let params = C::decode_params(&context.params)
                    .map_err(|failure| HandlerError::new(failure.reason))?;
                let output = handler(context, params).await?;
                C::encode_output(&output)
            }) as HandlerFuture
        });
        let validator: ValidatorFn =
            Arc::new(|params: &RpcParams| C::decode_params(params).map(|_| ()));

        self.register(FnCommandHandler::new(
            C::METHOD_NAME,
            Some(validator),
            executor,
        ))
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

fn wrap_executor<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(move |context: HandlerContext| Box::pin(handler(context)) as HandlerFuture)
}

/// The frozen method table.
///
/// There is no way to add or remove a handler once built, so it is shared
/// between tasks as a plain `Arc` without a lock.
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    pub fn resolve(&self, method: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
