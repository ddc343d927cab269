//! Domains module containing business logic organized by bounded contexts.
//!
//! - `tools` - the tool contract, tool implementations and their registry
//! - `fixtures` - YAML fixture loading for the monitoring tools

pub mod fixtures;
pub mod tools;
