//! Entitlement Sync - subscription entitlement for a posting application.
//!
//! Keeps each user's locally stored subscription status in step with the
//! billing provider (Stripe) through three paths: issuing checkout
//! sessions, processing signed webhooks, and a periodic reconciliation
//! sweep that re-derives status from the provider's own records. An
//! entitlement gate answers, from local state only, whether a user may
//! create posts and replies.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod runtime;
