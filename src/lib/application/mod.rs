//! # Application Module
//!
//! Agent synchronization and invocation logic of the MCP server.
//!
//! ## Submodules
//!
//! - [`invocation`] - Bounded-retry calls to a remote agent
//! - [`normalizer`] - Extraction of plain text from agent responses
//! - [`registry`] - Registry of agents that currently have a tool
//! - [`reconcile`] - One synchronization pass against the remote roster
//! - [`lifecycle`] - Startup, periodic sync and shutdown

pub mod agent_tool;
pub mod invocation;
pub mod lifecycle;
pub mod normalizer;
pub mod reconcile;
pub mod registry;
