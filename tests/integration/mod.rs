//! Integration tests for graph-upload
//! These run the client against a local mockito server with real HTTP

pub mod test_harness;

pub mod auth_flow_test;
pub mod config_test;
pub mod retry_test;
pub mod upload_test;
