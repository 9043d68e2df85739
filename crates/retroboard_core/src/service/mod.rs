//! Use-case services over the board store and the portability pipeline.
//!
//! # Responsibility
//! - Combine codec/recovery results with repository writes.
//! - Keep CLI and other callers decoupled from storage details.

pub mod board_service;
