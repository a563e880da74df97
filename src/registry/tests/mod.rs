//! Unit tests for registry services.
