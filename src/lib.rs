//! # Messenger Server Library
//!
//! This crate provides an internal messenger backend with:
//! - Per-user presence aggregated across concurrently connected sessions
//! - Direct and group messaging with strictly increasing per-conversation timestamps
//! - Unread tracking per (recipient, sender) pair
//! - Fan-out of events to every live session, optionally mirrored to Redis pub/sub
//! - PostgreSQL or in-memory persistence
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities, events and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Realtime registry, caches, database and notification backends
//! - **Presentation Layer**: HTTP handlers and WebSocket sessions
//!
//! ## Module Structure
//!
//! ```text
//! messenger_server/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, events and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Realtime, caches, database and Redis implementations
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, clock, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
