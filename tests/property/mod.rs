//! Property-based tests for queue ordering and identity guarantees

mod ordering;
