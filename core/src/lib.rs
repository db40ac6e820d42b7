pub mod calendar;
pub mod db;
pub mod export;
pub mod models;
pub mod precepts;
pub mod rotation;
pub mod service;
