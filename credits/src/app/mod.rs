//! Interactive purchase app.

mod render;
mod shell;
mod state;

pub use shell::run_app;
