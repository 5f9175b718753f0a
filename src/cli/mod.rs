//! Terminal front end: one-shot commands, the interactive shell and output styling

pub mod convert;
pub mod rate;
pub mod setup;
pub mod shell;
pub mod ui;
