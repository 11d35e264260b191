pub mod catalog;
pub mod config;
pub mod episode;
pub mod error;
pub mod extract;
pub mod models;
pub mod playback;
pub mod policy;
pub mod progress;
pub mod titles;
