//! Probe engine tests
//!
//! Endpoint parsing, dial target resolution, retry policy, the isahc client
//! against a local responder, and executor classification with mocks.

pub mod debug_logger_tests;
pub mod dialer_tests;
