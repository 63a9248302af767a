pub mod app;
pub mod config;
pub mod mock;
pub mod shared;
pub mod tui;
