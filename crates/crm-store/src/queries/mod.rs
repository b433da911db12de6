//! Query modules for the session's entity collections.

pub mod clients;
pub mod quotes;
pub mod requests;
