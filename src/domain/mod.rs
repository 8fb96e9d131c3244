pub mod day_codes;
pub mod models;
pub mod slots;
