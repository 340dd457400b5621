pub mod census;
pub mod country;
pub mod select;
