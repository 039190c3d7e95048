//! Integration tests for `interleave` live in `tests/`.
