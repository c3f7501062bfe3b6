//! Listkeeper Server - Session-scoped todo lists.
//!
//! This crate provides a small HTTP application where each visitor keeps
//! named todo lists for the lifetime of their session:
//! - Creating, renaming and deleting lists
//! - Adding, completing and deleting todos within a list
//! - Validating names and flashing status messages between requests
//!
//! # Architecture
//!
//! The list logic ([`validation`], [`ids`], [`repository`], [`presenter`])
//! is pure and synchronous. [`session`] holds each visitor's lists in
//! memory and [`routes`] maps HTTP requests onto them. Nothing is persisted;
//! a session's lists disappear when the session expires.

pub mod config;
pub mod error;
pub mod ids;
pub mod presenter;
pub mod repository;
pub mod routes;
pub mod session;
pub mod types;
pub mod validation;
