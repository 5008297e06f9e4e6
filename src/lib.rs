pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod ui;
pub mod utils;

pub use error::StoreError;
