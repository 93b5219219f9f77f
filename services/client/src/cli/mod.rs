pub mod command;
pub mod render;
pub mod repl;

pub use repl::run;
