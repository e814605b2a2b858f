//! Route handlers

pub mod countdown;
pub mod reports;
pub mod session;
