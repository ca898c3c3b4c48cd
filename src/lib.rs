pub mod aggregation;
pub mod app_config;
pub mod cache;
pub mod constants;
pub mod db;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod orm;
pub mod review_schema;
pub mod reviews;
pub mod user;
pub mod validation;
pub mod web;
