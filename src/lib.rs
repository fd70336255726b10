pub mod ai;
pub mod api;
pub mod config;
pub mod export;
pub mod ghost;
pub mod markup;
pub mod models;
pub mod runtime;
pub mod search;
pub mod seeds;
pub mod store;
pub mod transform;
pub mod workspace;
