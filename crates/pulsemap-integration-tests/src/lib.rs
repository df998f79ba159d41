//! Cross-crate aggregation properties; see `tests/`.
