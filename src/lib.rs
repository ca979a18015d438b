//! Donation Gateway - Donation and subscription billing service
//!
//! This crate binds HTTP handlers and database records to an external
//! payment processor: customers, cards, subscriptions, donations, and
//! webhook event reconciliation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
