//! Backend service: greeting, notification lookup and health check.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
