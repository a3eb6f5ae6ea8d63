//! Subject-to-verb dispatch.
//!
//! [`Handler`] turns a request body on `<prefix>.<verb>` into reply bytes for
//! any [`Store`]. It knows nothing about the record beyond its JSON form.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Reply for a successful `del`.
pub const DELETED_MESSAGE: &[u8] = br#"{"status":"deleted"}"#;

/// The CRUD capability a record type exposes on the bus.
///
/// Each call receives the raw request body. `get` and `del` must fail with
/// [`AppError::NotFound`] when the record cannot be resolved; `find` returns
/// an empty list rather than an error when nothing matches.
#[async_trait]
pub trait Store: Send + Sync {
    type Record: Serialize + Send;

    async fn get(&self, body: &[u8]) -> Result<Self::Record>;
    async fn set(&self, body: &[u8]) -> Result<Self::Record>;
    async fn del(&self, body: &[u8]) -> Result<()>;
    async fn find(&self, body: &[u8]) -> Result<Vec<Self::Record>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Del,
    Set,
    Find,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Del, Verb::Set, Verb::Find];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Del => "del",
            Verb::Set => "set",
            Verb::Find => "find",
        }
    }

    /// `<prefix>.<verb>`
    pub fn subject(&self, prefix: &str) -> String {
        format!("{prefix}.{}", self.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Handler<S> {
    store: S,
}

impl<S: Store> Handler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs `verb` against the store and encodes the reply.
    pub async fn handle(&self, verb: Verb, body: &[u8]) -> Vec<u8> {
        debug!(%verb, bytes = body.len(), "Handling request");
        let result = match verb {
            Verb::Get => self.store.get(body).await.and_then(|r| encode(&r)),
            Verb::Set => self.store.set(body).await.and_then(|r| encode(&r)),
            Verb::Find => self.store.find(body).await.and_then(|r| encode(&r)),
            Verb::Del => self.store.del(body).await.map(|()| DELETED_MESSAGE.to_vec()),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_not_found() {
                    debug!(%verb, error = %e, "Record not found");
                } else {
                    warn!(%verb, error = %e, "Request failed");
                }
                fail(&e)
            }
        }
    }

}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn fail(err: &AppError) -> Vec<u8> {
    // `ErrorBody` only holds strings; serialization cannot fail.
    serde_json::to_vec(&err.body()).unwrap_or_default()
}
