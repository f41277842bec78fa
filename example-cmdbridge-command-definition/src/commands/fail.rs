use cmdbridge::dispatch::CommandDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailParams {
    pub reason: String,
}

/// Always fails with an execution error carrying `reason`.
pub struct Fail;

impl CommandDefinition for Fail {
    const METHOD_NAME: &'static str = "fail";

    type Params = FailParams;
    type Output = Value;
}
