//! Core types and configuration shared by the Courier request signers.
//!
//! This crate holds the pieces that both delivery channels (Amazon SES and
//! Apple Push Notification service) build on: the caller-owned
//! [`RequestDescriptor`] that signers read, the ordered form [`BodyParams`]
//! whose encoding is hashed into SigV4 signatures, a validated [`AwsRegion`],
//! and the global [`CourierConfig`].

pub mod config;
mod error;
pub mod request;
mod types;

pub use config::{CourierConfig, parse_bool};
pub use error::{CourierError, CourierResult};
pub use request::{BodyParams, ParamValue, RequestDescriptor, form_encode};
pub use types::AwsRegion;
