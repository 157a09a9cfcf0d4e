pub mod path;
pub mod worker;
