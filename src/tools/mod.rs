pub mod args;
pub mod builtin;
pub mod definition;
pub mod executor;
pub mod registry;
