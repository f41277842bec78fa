mod delay;
mod document;
mod echo;
mod fail;
mod ping;

pub use delay::*;
pub use document::*;
pub use echo::*;
pub use fail::*;
pub use ping::*;

use serde::{Deserialize, Serialize};

/// Params for commands that take none. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoParams {}
