use super::NoParams;
use cmdbridge::dispatch::CommandDefinition;
use cmdbridge::envelope::RpcParams;
use cmdbridge::error::ValidationFailure;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub name: String,
    pub node_count: usize,
}

pub struct GetDocumentInfo;

impl CommandDefinition for GetDocumentInfo {
    const METHOD_NAME: &'static str = "get_document_info";

    type Params = NoParams;
    type Output = DocumentInfo;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRectangleParams {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
    pub name: String,
}

pub struct CreateRectangle;

impl CommandDefinition for CreateRectangle {
    const METHOD_NAME: &'static str = "create_rectangle";

    type Params = CreateRectangleParams;
    type Output = NodeRef;

    /// Rejects non-positive sizes on top of the shape check.
    fn decode_params(params: &RpcParams) -> Result<Self::Params, ValidationFailure> {
        let decoded: CreateRectangleParams =
            serde_json::from_value(Value::Object(params.clone()))?;
        if decoded.width <= 0.0 {
            return Err(ValidationFailure::field("width", "must be greater than 0"));
        }
        if decoded.height <= 0.0 {
            return Err(ValidationFailure::field("height", "must be greater than 0"));
        }
        Ok(decoded)
    }
}
