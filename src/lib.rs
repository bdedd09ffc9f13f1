pub mod app;
pub mod cli;
pub mod config;
pub mod locator;
pub mod logging;
pub mod pty;
pub mod relay;
pub mod runner;
pub mod workdir;
