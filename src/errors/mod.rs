//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for each compilation phase
//! - The category split between user-facing and internal failures
//! - Helpful error messages and suggestions

pub mod errors;
