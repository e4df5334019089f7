// src/lib.rs

pub mod config;
pub mod db;
pub mod http;
pub mod cache;
pub mod assets;
pub mod platforms;
pub mod repositories;
pub mod render;
pub mod services;
pub mod tasks;
pub mod utils;

pub use db::Database;
pub use madoka_common::error::Error;
pub use http::{DefaultHttpClient, HttpClient, HttpClientManager};
