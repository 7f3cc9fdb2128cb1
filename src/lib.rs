//! Product catalog REST service
//!
//! Creates, reads, updates and deletes product records whose images are
//! hosted in S3-compatible object storage, with PostgreSQL as the record store.

pub mod app;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod slug;
pub mod storage;
pub mod web;

pub use error::{Error, Result};
