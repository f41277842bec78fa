use crate::envelope::RpcParams;
use crate::error::{HandlerError, ValidationFailure};
use serde::{Serialize, de::DeserializeOwned, ser::Error as _};
use serde_json::Value;

/// Typed description of one command, shared by the calling and the handling
/// side so both agree on the method name and the shape of its params and
/// result.
pub trait CommandDefinition {
    /// The method name the command is registered and called under.
    const METHOD_NAME: &'static str;

    type Params: Serialize + DeserializeOwned + Send + 'static;

    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Encodes typed params into the untyped bag carried on the wire.
    fn encode_params(params: &Self::Params) -> serde_json::Result<RpcParams> {
        match serde_json::to_value(params)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(RpcParams::new()),
            _ => Err(serde_json::Error::custom(
                "command params must serialize to a JSON object",
            )),
        }
    }

    /// Decodes the untyped bag. A failure here is reported as invalid params.
    fn decode_params(params: &RpcParams) -> Result<Self::Params, ValidationFailure> {
        serde_json::from_value(Value::Object(params.clone())).map_err(ValidationFailure::from)
    }

    fn encode_output(output: &Self::Output) -> Result<Value, HandlerError> {
        Ok(serde_json::to_value(output)?)
    }

    fn decode_output(value: Value) -> serde_json::Result<Self::Output> {
        serde_json::from_value(value)
    }
}
