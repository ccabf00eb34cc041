pub mod actions;
pub mod canvas;
pub mod catalog;
pub mod client;
pub mod clipboard;
pub mod collectors;
pub mod config;
pub mod hits;
pub mod host;
pub mod http;
pub mod input;
pub mod poller;
pub mod render;
pub mod resize;
pub mod state;
pub mod widget;

pub use widget::{Dashboard, DashboardOptions};
