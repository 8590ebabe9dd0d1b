//! Request routing.
//!
//! Routes are checked in a fixed order and the first match wins:
//!
//! | Pattern          | Kind       | Handler    |
//! |------------------|------------|------------|
//! | `/`              | exact      | root       |
//! | `/echo/`         | prefix     | echo       |
//! | `/user-agent`    | exact      | user-agent |
//! | `/files/`        | prefix     | files      |
//!
//! Anything else is a 404. Prefix routes hand the remainder of the target
//! (possibly empty) to their handler.

use crate::http::request::Method;

/// How a route compares against a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Target must equal the string.
    Exact(&'static str),
    /// Target must start with the string; the rest is the argument.
    Prefix(&'static str),
}

impl Pattern {
    /// Returns the argument captured from `target`, or `None` on a miss.
    ///
    /// Exact patterns capture an empty argument.
    pub fn matches<'a>(&self, target: &'a str) -> Option<&'a str> {
        match self {
            Pattern::Exact(path) => (target == *path).then_some(""),
            Pattern::Prefix(prefix) => target.strip_prefix(prefix),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Root,
    Echo,
    UserAgent,
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub pattern: Pattern,
    pub handler: HandlerKind,
}

/// The single outcome of routing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Root,
    Echo(&'a str),
    UserAgent,
    ReadFile(&'a str),
    CreateFile(&'a str),
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: vec![
                Route { pattern: Pattern::Exact("/"), handler: HandlerKind::Root },
                Route { pattern: Pattern::Prefix("/echo/"), handler: HandlerKind::Echo },
                Route { pattern: Pattern::Exact("/user-agent"), handler: HandlerKind::UserAgent },
                Route { pattern: Pattern::Prefix("/files/"), handler: HandlerKind::Files },
            ],
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Maps a method and target to exactly one outcome.
    ///
    /// Only `/files/` looks at the method: GET reads, POST creates, and
    /// everything else is 405.
    pub fn resolve<'a>(&self, method: Method, target: &'a str) -> Outcome<'a> {
        let Some((route, arg)) = self
            .routes
            .iter()
            .find_map(|route| route.pattern.matches(target).map(|arg| (route, arg)))
        else {
            return Outcome::NotFound;
        };

        match route.handler {
            HandlerKind::Root => Outcome::Root,
            HandlerKind::Echo => Outcome::Echo(arg),
            HandlerKind::UserAgent => Outcome::UserAgent,
            HandlerKind::Files => match method {
                Method::GET => Outcome::ReadFile(arg),
                Method::POST => Outcome::CreateFile(arg),
                Method::PUT | Method::DELETE => Outcome::MethodNotAllowed,
            },
        }
    }
}
