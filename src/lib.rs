// Rules via cozy-chess, analysis via an external UCI engine, JSON over HTTP
pub mod board;
pub mod config;
pub mod engine;
pub mod server;
pub mod stub;
