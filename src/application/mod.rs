pub mod bootstrap;
pub mod commands;
pub mod lifecycle;
pub mod reconciler;
pub mod stats;
