use crate::DocumentModel;
use cmdbridge::dispatch::{HandlerContext, HandlerRegistry};
use cmdbridge::error::{HandlerError, RegistryError};
use example_cmdbridge_command_definition::{
    CreateRectangle, Delay, DelayResult, Echo, Fail, GetDocumentInfo, Ping, PingResult,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Builds the example method table over `document`.
pub fn build_registry(document: Arc<dyn DocumentModel>) -> Result<HandlerRegistry, RegistryError> {
    let mut builder = HandlerRegistry::builder();

    builder
        .register_command::<Ping, _, _>(|_, _| async move { Ok(PingResult { pong: true }) })?
        .register_command::<Echo, _, _>(|_, params| async move { Ok(params) })?
        .register_command::<Delay, _, _>(|_, params| async move {
            tokio::time::sleep(Duration::from_millis(params.ms)).await;
            Ok(DelayResult { slept_ms: params.ms })
        })?
        .register_command::<Fail, _, _>(|context: HandlerContext, params| async move {
            Err(HandlerError::new(params.reason)
                .with_data(json!({ "clientId": context.client_id })))
        })?;

    let info_document = document.clone();
    builder.register_command::<GetDocumentInfo, _, _>(move |_, _| {
        let document = info_document.clone();
        async move { Ok(document.info().await) }
    })?;

    builder.register_command::<CreateRectangle, _, _>(move |context, params| {
        let document = document.clone();
        async move {
            tracing::debug!(
                "{} creating a {}x{} rectangle",
                context.client_id,
                params.width,
                params.height
            );
            document.create_rectangle(params).await
        }
    })?;

    Ok(builder.build())
}
