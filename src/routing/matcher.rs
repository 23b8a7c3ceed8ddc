//! Route matching module
//!
//! Matching is an exact, case-sensitive comparison against the full request
//! target (path plus query), so `/subscribe/` and `/subscribe?x=1` miss.

/// A single entry in the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub action: RouteAction,
}

/// Route action - what to do when a route matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// HTTP redirect
    Redirect { target: &'static str, code: u16 },
}

/// The route table. Anything not listed here is a 404.
pub const ROUTES: &[Route] = &[Route {
    path: "/subscribe",
    action: RouteAction::Redirect {
        target: "http://127.0.0.1:3000",
        code: 302,
    },
}];

/// Find the first route whose path equals the request target
pub fn match_route<'a>(target: &str, routes: &'a [Route]) -> Option<&'a Route> {
    routes.iter().find(|route| route.path == target)
}
