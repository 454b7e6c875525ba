// Domain layer - Graph definitions and the pure data pipeline
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod export;
pub mod format;
pub mod graph;
pub mod table;
pub mod time_scale;
pub mod variables;
