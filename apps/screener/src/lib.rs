//! Resume screening: document extraction, heuristic resume parsing, and explainable
//! multi-factor scoring of candidates against job roles, with an axum service on top.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod extraction;
pub mod models;
pub mod parsing;
pub mod routes;
pub mod scoring;
pub mod screening;
pub mod state;
