//! Integration tests with mock HTTP server

mod async_client;
mod mock_server;
