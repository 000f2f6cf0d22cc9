pub mod astro;
pub mod calendar;
pub mod dates;
pub mod error;
pub mod lunar;
pub mod pillars;
pub mod vsop87;

pub use calendar::{AstronomicalCalendar, Calendar};
pub use dates::*;
pub use error::{CalendarError, CalendarResult};
pub use lunar::{LunarDate, LunarMonth};
pub use pillars::*;
