// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret containers used throughout the crate.

pub use secure_gate::{dynamic_alias, fixed_alias};

// Fixed-size secrets, one per AES key size
fixed_alias!(AesKey16, 16); // AES-128
fixed_alias!(AesKey24, 24); // AES-192
fixed_alias!(AesKey32, 32); // AES-256
fixed_alias!(CipherIv16, 16); // fixed CBC IV shared by the process

// Dynamic secrets
dynamic_alias!(SecretBytes, Vec<u8>); // decoded key/IV material before sizing
