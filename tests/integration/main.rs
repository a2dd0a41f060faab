//! Black-box tests against a running server

mod api_tests;
