//! Authorization
//!
//! Every param operation consults an [`Authorizer`] per node it touches.
//! [`ScopeAuthorizer`] is the standard implementation: a client holds a set
//! of scopes, usually taken from the `scope` claim of a JWS bearer token.
//!
//! - read access to a node requires its scope, or its write scope
//! - write access requires the write scope (`<scope>:w`) and a node that is
//!   not read-only
//!
//! [`ScopeAuthorizer::disabled`] grants everything and is used when a device
//! runs without authorization.

use crate::descriptor::ParamDescriptor;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Capability check consulted at every node
pub trait Authorizer: Send + Sync {
    /// True if the client may read params governed by `descriptor`
    fn read_authz(&self, descriptor: &ParamDescriptor) -> bool;

    /// True if the client may write params governed by `descriptor`
    fn write_authz(&self, descriptor: &ParamDescriptor) -> bool;
}

/// Well-known scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Observe
    Monitor,
    /// Operate
    Operate,
    /// Configure
    Config,
    /// Administer
    Admin,
}

impl Scope {
    /// Scope string
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Monitor => "st2138:mon",
            Scope::Operate => "st2138:op",
            Scope::Config => "st2138:cfg",
            Scope::Admin => "st2138:adm",
        }
    }

    /// Write variant of the scope string
    pub fn write(&self) -> String {
        format!("{}:w", self.as_str())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DISABLED: Lazy<ScopeAuthorizer> = Lazy::new(|| ScopeAuthorizer {
    scopes: FxHashSet::default(),
    exp: None,
    disabled: true,
});

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Scope-set authorizer
#[derive(Debug, Clone)]
pub struct ScopeAuthorizer {
    scopes: FxHashSet<String>,
    exp: Option<i64>,
    disabled: bool,
}

impl ScopeAuthorizer {
    /// Authorizer holding exactly `scopes`
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeAuthorizer {
            scopes: scopes.into_iter().map(Into::into).collect(),
            exp: None,
            disabled: false,
        }
    }

    /// Shared authorizer that grants every request
    pub fn disabled() -> &'static ScopeAuthorizer {
        &DISABLED
    }

    /// Decode the scopes of a compact JWS token
    ///
    /// Only the payload is decoded; signature verification belongs to the
    /// transport that accepted the token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the token is not three dot-separated
    /// base64url parts with a JSON payload.
    pub fn from_jws(token: &str) -> Result<Self> {
        let invalid = || {
            debug!(target: "catena::authz", "rejected malformed JWS token");
            Error::unauthenticated("Invalid JWS Token")
        };

        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

        let scopes = claims
            .scope
            .as_deref()
            .unwrap_or("")
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ScopeAuthorizer {
            scopes,
            exp: claims.exp,
            disabled: false,
        })
    }

    /// True for the shared disabled instance
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// True if the client holds `scope` (always true when disabled)
    pub fn has_authz(&self, scope: &str) -> bool {
        self.disabled || self.scopes.contains(scope)
    }

    /// Read check on a bare scope
    pub fn read_scope(&self, scope: &str) -> bool {
        self.has_authz(scope) || self.write_scope(scope)
    }

    /// Write check on a bare scope
    pub fn write_scope(&self, scope: &str) -> bool {
        self.has_authz(&format!("{}:w", scope))
    }

    /// Scopes held by the client
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// True once the token's `exp` claim has passed
    pub fn is_expired(&self) -> bool {
        match self.exp {
            Some(exp) => chrono::Utc::now().timestamp() >= exp,
            None => false,
        }
    }
}

impl Authorizer for ScopeAuthorizer {
    fn read_authz(&self, descriptor: &ParamDescriptor) -> bool {
        self.read_scope(&descriptor.scope())
    }

    fn write_authz(&self, descriptor: &ParamDescriptor) -> bool {
        !descriptor.read_only() && self.write_scope(&descriptor.scope())
    }
}
