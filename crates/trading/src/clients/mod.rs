//! Clients for remote collaborators used during negotiation

pub mod asset;
