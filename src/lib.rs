pub mod config;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod teams;
