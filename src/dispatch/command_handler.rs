use crate::dispatch::HandlerContext;
use crate::envelope::RpcParams;
use crate::error::{HandlerError, ValidationFailure};
use serde_json::Value;
use std::{future::Future, pin::Pin, sync::Arc};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

pub type HandlerFn = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

pub type ValidatorFn = Arc<dyn Fn(&RpcParams) -> Result<(), ValidationFailure> + Send + Sync>;

/// A unit of work bound to one method name.
///
/// The dispatcher knows nothing about what a handler does; it only resolves
/// it by `name`, checks `validate`, and awaits `execute`.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Handlers without a validator accept every parameter bag.
    fn validate(&self, _params: &RpcParams) -> Result<(), ValidationFailure> {
        Ok(())
    }

    async fn execute(&self, context: HandlerContext) -> Result<Value, HandlerError>;
}

/// A handler assembled from closures.
pub struct FnCommandHandler {
    name: String,
    validator: Option<ValidatorFn>,
    executor: HandlerFn,
}

impl FnCommandHandler {
    pub fn new(name: impl Into<String>, validator: Option<ValidatorFn>, executor: HandlerFn) -> Self {
        Self {
            name: name.into(),
            validator,
            executor,
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for FnCommandHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, params: &RpcParams) -> Result<(), ValidationFailure> {
        match &self.validator {
            Some(validator) => validator(params),
            None => Ok(()),
        }
    }

    async fn execute(&self, context: HandlerContext) -> Result<Value, HandlerError> {
        (self.executor)(context).await
    }
}
