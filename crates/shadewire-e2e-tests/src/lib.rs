//! End-to-end tests for shadewire live under `tests/`.
