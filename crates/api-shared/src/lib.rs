//! # API Shared
//!
//! Wire types shared by the OSS HTTP surface and its clients.
//!
//! Contains:
//! - The response envelope ([`ApiResponse`]) every JSON reply is wrapped in
//! - Payload types (`UploadRes`, `HealthRes`)
//! - `HealthService`
//!
//! Used by `api-rest`; nothing here touches storage.

pub mod health;
pub mod response;

pub use health::{HealthRes, HealthService};
pub use response::{ApiResponse, ErrorResBody, UploadRes, UploadResBody};
