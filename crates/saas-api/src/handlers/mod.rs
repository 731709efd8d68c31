//! HTTP handlers

pub mod account;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod health;
pub mod stripe;
pub mod team;
