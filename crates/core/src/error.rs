use std::fmt;
use serde::{Deserialize, Serialize};

/// The class a failed operation belongs to.
///
/// Every domain error maps to exactly one of the first four kinds.
/// `Internal` covers infrastructure faults (storage, serialization) that no
/// domain rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role or voting weight
    Authorization,
    /// Operation is invalid in the entity's current state
    State,
    /// A policy rule (quorum, margin, spend limit, balance) rejected the operation
    Policy,
    /// A nested call into another component failed
    ExternalCall,
    /// Storage or serialization failure
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Authorization => "AuthorizationError",
            ErrorKind::State => "StateError",
            ErrorKind::Policy => "PolicyViolation",
            ErrorKind::ExternalCall => "ExternalCallFailure",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}
