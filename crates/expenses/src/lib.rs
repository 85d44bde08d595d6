pub mod handler;
pub mod models;
mod processed_repository;
mod repository;
pub mod service;
