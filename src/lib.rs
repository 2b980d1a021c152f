pub mod activity;
pub mod aggregate;
pub mod analytics;
pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod insight;
pub mod labels;
pub mod state;
pub mod window;
