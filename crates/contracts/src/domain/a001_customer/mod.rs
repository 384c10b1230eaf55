pub mod aggregate;
pub mod patch;
pub mod search;
