//! Routing module
//!
//! Holds the fixed route table and exact request-target matching.

mod matcher;

pub use matcher::{match_route, RouteAction, ROUTES};
