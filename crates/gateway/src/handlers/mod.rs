//! Request handlers

pub mod health;
pub mod matches;
pub mod professors;
pub mod sessions;
