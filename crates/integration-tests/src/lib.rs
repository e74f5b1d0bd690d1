//! End-to-end scenarios live under `tests/`; this crate has no library
//! surface of its own.
