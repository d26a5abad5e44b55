//! Libris application library
//!
//! Books and authors modules, their shared response views, and the
//! application bootstrap used by both the server binary and the CLI.

pub mod app;
pub mod modules;
pub mod utils;
pub mod views;

pub use app::App;
