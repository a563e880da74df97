//! Unit tests for the authorized gateway facade.
