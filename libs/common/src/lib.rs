//! Common library for the StudyLink backend
//!
//! This crate provides the infrastructure shared by StudyLink services:
//! PostgreSQL connection pooling and migrations, the Redis session cache,
//! and the shared database error taxonomy.

pub mod cache;
pub mod database;
pub mod error;
