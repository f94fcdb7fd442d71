pub mod bling;
pub mod commands;
pub mod retry;
pub mod runtime;
