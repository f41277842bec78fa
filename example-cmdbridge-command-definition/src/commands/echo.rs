use cmdbridge::dispatch::CommandDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoParams {
    pub message: String,
}

pub struct Echo;

impl CommandDefinition for Echo {
    const METHOD_NAME: &'static str = "echo";

    type Params = EchoParams;
    type Output = EchoParams;
}
