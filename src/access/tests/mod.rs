//! Unit tests for access services.

mod service_tests;
