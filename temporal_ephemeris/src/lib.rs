pub mod core;
pub mod lunar;
pub mod terms;

pub use crate::core::{julday, revjul, sun_longitude, CalculationError};
pub use crate::lunar::{lunar_to_solar, solar_to_lunar, LunarDate, LunarMonth};
pub use crate::terms::{SolarTerm, TermCrossing};
