use super::NoParams;
use cmdbridge::dispatch::CommandDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub pong: bool,
}

pub struct Ping;

impl CommandDefinition for Ping {
    const METHOD_NAME: &'static str = "ping";

    type Params = NoParams;
    type Output = PingResult;
}
