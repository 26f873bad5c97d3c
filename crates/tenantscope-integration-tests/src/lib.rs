//! End-to-end integration tests for Tenantscope
//!
//! The tests in `tests/` wire the middleware, pipeline and context layers
//! together over axum routers to verify the full request flow.
