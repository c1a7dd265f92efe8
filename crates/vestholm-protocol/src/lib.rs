mod pos;
mod snapshot;
mod types;
mod wire;

pub use crate::pos::*;
pub use crate::snapshot::*;
pub use crate::types::*;
pub use crate::wire::*;
