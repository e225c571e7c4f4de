//! Shared fakes for the integration tests under tests/.
#![allow(dead_code)]

pub mod mock_client;
