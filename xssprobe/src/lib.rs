pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{format_event, load_exclusions, load_ignore_list, parse_target};

pub use commands::command_argument_builder;
