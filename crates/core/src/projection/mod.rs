pub mod expand;
pub mod month;

pub use expand::{expand, expand_with, ExpandOptions};
pub use month::{MonthRow, MonthView};
