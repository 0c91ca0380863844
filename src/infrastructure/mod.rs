//! Infrastructure Layer
//!
//! Contains implementations for external services and in-process state:
//! - Realtime session registry, presence aggregation and fan-out
//! - Sequencing, unread and directory caches
//! - Database repositories (PostgreSQL and in-memory)
//! - Redis notification backend
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod metrics;
pub mod notifications;
pub mod realtime;
pub mod repositories;
