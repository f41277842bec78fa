use crate::caller::CommandCaller;
use crate::dispatch::CommandDefinition;
use crate::error::RpcCallerError;

/// `.call()` for every [`CommandDefinition`], over any [`CommandCaller`].
///
/// Encodes the typed params, performs the call, and decodes the typed
/// output, so call sites never touch the untyped bag.
#[async_trait::async_trait]
pub trait CommandCall: CommandDefinition {
    async fn call<C>(caller: &C, params: Self::Params) -> Result<Self::Output, RpcCallerError>
    where
        C: CommandCaller + ?Sized;
}

#[async_trait::async_trait]
impl<T> CommandCall for T
where
    T: CommandDefinition + Send + Sync + 'static,
{
    async fn call<C>(caller: &C, params: Self::Params) -> Result<Self::Output, RpcCallerError>
    where
        C: CommandCaller + ?Sized,
    {
        let encoded = T::encode_params(&params).map_err(RpcCallerError::Codec)?;
        let value = caller.call(T::METHOD_NAME, encoded).await?;
        T::decode_output(value).map_err(RpcCallerError::Codec)
    }
}
