pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod integrity;
pub mod models;
pub mod pdf;
pub mod templates_structs;
pub mod workflow;
