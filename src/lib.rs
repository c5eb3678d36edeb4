//! Trip planning API: two-phase AI itinerary generation for tourists, served
//! over actix-web with MongoDB persistence.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
