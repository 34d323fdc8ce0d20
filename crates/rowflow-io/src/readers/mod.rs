//! File-backed renewable sources.

pub mod jsonl;
