//! Action-Uses API: GitHub Capability Layer
//!
//! This crate provides the transport layer for the action-uses inventory.
//! It exposes the three GitHub capabilities the discovery engine needs
//! behind a single async trait, plus a `reqwest` implementation of it.
//!
//! ## Layer 0 - Transport
//!
//! Focus: Faithful status mapping, rate-limit signal detection, pagination hints.
//!
//! ## Key Components
//!
//! - `GithubApi`: GraphQL, code-search and content-fetch capability
//! - `RestClient`: `reqwest`-backed implementation against api.github.com
//! - `ApiError`: Status taxonomy (bad credentials, rate limits, not found, ...)
//! - `fakes::ScriptedApi`: In-memory scripted implementation for tests

pub mod api;
mod client;
mod error;
pub mod fakes;
pub mod types;

pub use api::{GithubApi, RequestDescriptor};
pub use client::{ClientConfig, RestClient, DEFAULT_API_URL};
pub use error::{ApiError, ApiResult};
pub use types::{CodeSearchItem, ContentFile, OwnerRef, RepositoryRef, SearchPage};
