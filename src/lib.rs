//! # Courtside
//!
//! Tournament court and time scheduling engine.
//!
//! This crate implements the scheduling core of a tournament management
//! backend: it assigns competitive encounters (matches) to physical courts
//! and computes start/end times across the divisions of an event, honoring
//! inter-block dependencies and surfacing conflicts. The surrounding
//! platform (registration, bracket generation, messaging, permissions) is an
//! external collaborator reached through the repository traits.
//!
//! ## Features
//!
//! - **Court pools**: resolve eligible courts per division/phase from
//!   configured court-group assignments
//! - **Greedy assignment**: deterministic earliest-court placement with
//!   per-encounter durations, plus an untimed round-robin mode
//! - **Schedule blocks**: time-boxed, court-scoped scheduling waves with
//!   single-hop dependencies and buffers
//! - **Conflict detection**: advisory court-overlap and dependency-start
//!   findings, never hard errors
//! - **Views**: event timeline and per-participant itineraries
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: identifier newtypes and structured result types
//! - [`models`]: domain entities and status enums
//! - [`db`]: repository traits, error types, and the in-memory backend
//! - [`scheduler`]: the algorithmic core and orchestration
//! - [`services`]: read-only timeline and player schedule projections
//!
//! ## Determinism
//!
//! Within one invocation, encounters are processed in a deterministic
//! documented order (round then encounter number; pool first for
//! phase-level runs). This ordering is a contract, not an implementation
//! detail, and the test suite asserts on it.

pub mod api;

pub mod db;
pub mod models;

pub mod scheduler;

pub mod services;
