pub mod alert;
pub mod config;
pub mod desk;
pub mod engine;
pub mod error;
pub mod event;
pub mod feed;
pub mod input;
pub mod model;
pub mod series;
pub mod ui;
pub mod window;
