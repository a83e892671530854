// Player records and their stored analyses.

pub mod handlers;
pub mod store;
