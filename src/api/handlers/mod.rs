//! API handlers for Foyer.
//!
//! This module organizes the service's route handlers: the auth flow
//! (sign-in handshake, session rehydration, login recording, tenant lookup),
//! self-service profile endpoints, login history, and health.

pub mod auth;
pub mod health;
pub mod me;
pub mod root;
pub mod users;
