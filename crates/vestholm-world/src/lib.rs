mod geom;
mod map;
mod minimap;
mod rng;
mod road;
mod save;
pub mod soak;
mod update;

pub use crate::geom::*;
pub use crate::map::*;
pub use crate::rng::*;
pub use crate::road::*;
pub use crate::save::*;
pub use crate::soak::{run_soak, SoakConfig, SoakGenerator, SoakReport};
