pub mod admin;
pub mod api;
pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod loader;
pub mod partition;
pub mod record;
pub mod sink;
pub mod source;
pub mod throttle;
