//! Diagnostic channel and its JSONL backend.

pub mod diagnostics;
pub mod jsonl;
