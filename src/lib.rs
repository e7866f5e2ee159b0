//! Tool-calling academic advising agent for the Claremont Colleges.
//!
//! A user message goes through [`agents::advisor::Advisor::respond`]: history is
//! loaded from a [`session::SessionStore`], the model backend may request catalog
//! tools once, the [`tools::executor::ToolExecutor`] answers each request against the
//! [`store::CatalogStore`], and the final answer is appended to the session.

pub mod agents;
pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestration;
pub mod seed;
pub mod session;
pub mod state;
pub mod store;
pub mod tools;
