//! Firebase Cloud Messaging delivery gateway for Coursecast
//!
//! This crate implements the [`PushGateway`](coursecast_common::PushGateway)
//! contract on top of the FCM HTTP v1 API.
//!
//! # Features
//!
//! - Authentication with Firebase using service account credentials, one project per partner
//! - Sending push notifications to a device token or a topic
//! - Multicast to many tokens with per-token outcomes
//! - Support for notification payload (title and body) and custom data payload
//!
//! # Example
//!
//! ```rust,no_run
//! use coursecast_common::{BoxedGateway, BoxedError, PushGateway};
//! use coursecast_firebase::{FirebaseClient, FirebaseGateway};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! fn gateway() -> Result<Arc<dyn PushGateway<Error = BoxedError>>, Box<dyn std::error::Error>> {
//!     let client = FirebaseClient::new(Duration::from_secs(10))?;
//!     Ok(Arc::new(BoxedGateway(FirebaseGateway::new(client))))
//! }
//! ```

pub mod auth;
pub mod client;
pub mod gateway;

pub use auth::{AccessTokenProvider, ServiceAccountTokenProvider, StaticTokenProvider};
pub use client::{FirebaseClient, FirebaseError};
pub use gateway::FirebaseGateway;
