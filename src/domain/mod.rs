// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the concepts
// of the system. No burn types and no file I/O in this layer.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Bearish / bullish label and its one-hot encoding
pub mod sentiment;

// Parallel message / label collection
pub mod corpus;

// Core abstractions (traits) that other layers implement
pub mod traits;
