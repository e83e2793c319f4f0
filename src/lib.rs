//! findash: a terminal dashboard for live weather, crypto and stock data.
//!
//! Each page owns its own state and refreshes through a `poller::Poller`
//! session. Fetch tasks report back over a channel and `app::App` applies the
//! results on the UI task, dropping anything from a session that has ended.

pub mod api;
pub mod app;
pub mod config;
pub mod crypto;
pub mod error;
pub mod poller;
pub mod stock;
pub mod ui;
pub mod weather;
