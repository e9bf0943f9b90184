//! Collaborator interfaces: credential checking and authorization
//!
//! Both traits are async so implementations may consult a database; plain
//! closures work through the blanket impls.

use crate::timing::password_matches;
use async_trait::async_trait;
use http::request::Parts;
use std::collections::HashMap;

/// Checks a username/password pair at login
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> bool;
}

#[async_trait]
impl<F> Authenticator for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    async fn authenticate(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// Decides whether an authenticated identity may perform `request`.
/// Only called after the token has been verified.
#[async_trait]
pub trait Authorizator: Send + Sync {
    async fn authorize(&self, identity: &str, request: &Parts) -> bool;
}

#[async_trait]
impl<F> Authorizator for F
where
    F: Fn(&str, &Parts) -> bool + Send + Sync,
{
    async fn authorize(&self, identity: &str, request: &Parts) -> bool {
        self(identity, request)
    }
}

/// Default authorizator: every verified identity is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

#[async_trait]
impl Authorizator for PermitAll {
    async fn authorize(&self, _identity: &str, _request: &Parts) -> bool {
        true
    }
}

/// Fixed in-memory user table
#[derive(Clone, Default)]
pub struct StaticUsers {
    users: HashMap<String, String>,
}

impl StaticUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<(String, String)> for StaticUsers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        StaticUsers {
            users: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticUsers {
    async fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(expected) => password_matches(expected, password),
            None => false,
        }
    }
}
