//! Jobwatch binary support: configuration, wiring and terminal I/O.
pub mod app;
pub mod config;
pub mod console;
pub mod render;
