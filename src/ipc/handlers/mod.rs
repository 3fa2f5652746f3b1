pub mod core;
pub mod failing;
pub mod input;
