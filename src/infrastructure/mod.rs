// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod http_graph_store;
pub mod http_response;
pub mod http_transport;
pub mod stream_renderer;
