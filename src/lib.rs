pub mod batch;
pub mod config;
pub mod forwarder;
pub mod http;
pub mod runtime;
pub mod sink;
