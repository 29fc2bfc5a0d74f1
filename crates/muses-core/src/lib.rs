//! Core types and trait definitions for the MuSES resource services.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the three entities (users, museums, artworks), their validation
//! rules and search parameters, the store-independent [`filter::Filter`], and
//! the generic CRUD engine ([`repository::Repository`] and
//! [`service::EntityService`]) that every resource service shares.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod artwork;
pub mod authority;
pub mod entity;
pub mod error;
pub mod filter;
pub mod museum;
pub mod repository;
pub mod service;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
