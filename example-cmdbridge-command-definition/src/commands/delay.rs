use cmdbridge::dispatch::CommandDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    pub ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayResult {
    pub slept_ms: u64,
}

/// Sleeps for `ms` milliseconds, then answers. Handy for exercising
/// out-of-order completion and timeouts.
pub struct Delay;

impl CommandDefinition for Delay {
    const METHOD_NAME: &'static str = "delay";

    type Params = DelayParams;
    type Output = DelayResult;
}
