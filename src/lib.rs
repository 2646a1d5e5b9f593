// Configuration and ambient concerns
pub mod config;
pub mod error;
pub mod logging;

// Storage adapters
pub mod cache;
pub mod db;
pub mod repository;

// External service adapters
pub mod auth;
pub mod llm;
pub mod mail;

// Application layer
pub mod usecase;

// HTTP Server modules
pub mod handlers;
pub mod models;
pub mod routes;
