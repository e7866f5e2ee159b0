pub mod advisor;
pub mod prompt;
