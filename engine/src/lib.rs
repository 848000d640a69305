//! Troupe Engine Library
//!
//! This library provides the core functionality of the Troupe engine:
//! a team of role-specialized AI agents sharing persisted project memory,
//! with requests routed across interchangeable model backends.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Engine error types
pub mod error;

/// Secret management module
pub mod secrets;

/// Database persistence module
pub mod db;

/// Model backend abstraction, selection, and routing
pub mod llm;

/// Context assembly for agent prompts
pub mod context;

/// Role-specialized agents and handoffs
pub mod agent;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
