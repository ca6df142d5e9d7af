pub mod config;
pub mod crawler;
