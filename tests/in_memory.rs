//! In-memory gateway integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `gateway_flow_tests`: Registration through invocation and teardown
//! - `access_tests`: Production credentials and client scoping
//! - `concurrency_tests`: Racing registrations and invocations

mod in_memory {
    pub mod helpers;

    mod access_tests;
    mod concurrency_tests;
    mod gateway_flow_tests;
}
