//! Shared identifiers and value types

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Identifier of a proposal, assigned from a monotonic counter
pub type ProposalId = u64;

/// Fungible value held by the treasury
pub type Amount = u64;

/// Voting power of a principal
pub type Weight = u64;

/// A uniquely identified actor allowed to invoke operations
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a principal identifier from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrincipalId({})", self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A ballot option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

impl VoteChoice {
    /// Numeric code used by external agents (1 = for, 2 = against, 3 = abstain)
    pub fn code(self) -> u8 {
        match self {
            VoteChoice::For => 1,
            VoteChoice::Against => 2,
            VoteChoice::Abstain => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(VoteChoice::For),
            2 => Some(VoteChoice::Against),
            3 => Some(VoteChoice::Abstain),
            _ => None,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoteChoice::For => "for",
            VoteChoice::Against => "against",
            VoteChoice::Abstain => "abstain",
        };
        f.write_str(name)
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "for" | "yes" | "1" => Ok(VoteChoice::For),
            "against" | "no" | "2" => Ok(VoteChoice::Against),
            "abstain" | "3" => Ok(VoteChoice::Abstain),
            other => Err(format!("unknown vote choice: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_choice_parsing() {
        assert_eq!("FOR".parse::<VoteChoice>().unwrap(), VoteChoice::For);
        assert_eq!("2".parse::<VoteChoice>().unwrap(), VoteChoice::Against);
        assert_eq!(" abstain ".parse::<VoteChoice>().unwrap(), VoteChoice::Abstain);
        assert!("maybe".parse::<VoteChoice>().is_err());

        for choice in [VoteChoice::For, VoteChoice::Against, VoteChoice::Abstain] {
            assert_eq!(VoteChoice::from_code(choice.code()), Some(choice));
        }
        assert_eq!(VoteChoice::from_code(0), None);
    }

    #[test]
    fn test_principal_serializes_as_plain_string() {
        let principal = PrincipalId::new("alice");
        assert_eq!(serde_json::to_string(&principal).unwrap(), "\"alice\"");
        assert_eq!(format!("{:?}", principal), "PrincipalId(alice)");
    }
}
