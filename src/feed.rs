//! Proposal feed for off-chain decision agents
//!
//! A JSON array of proposals with camelCase fields. Agents read it to decide
//! how to vote; it carries tallies but no vote records.

use serde::{Deserialize, Serialize};

use steward_core::{ProposalId, Weight};
use steward_governance::Proposal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFeedEntry {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub votes_for: Weight,
    pub votes_against: Weight,
    pub votes_abstain: Weight,
    pub executed: bool,
}

impl From<&Proposal> for ProposalFeedEntry {
    fn from(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id,
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            proposer: proposal.proposer.to_string(),
            votes_for: proposal.tally.votes_for,
            votes_against: proposal.tally.votes_against,
            votes_abstain: proposal.tally.votes_abstain,
            executed: proposal.executed,
        }
    }
}

/// Render `proposals` as the pretty-printed feed document
pub fn proposal_feed(proposals: &[Proposal]) -> serde_json::Result<String> {
    let entries: Vec<ProposalFeedEntry> = proposals.iter().map(ProposalFeedEntry::from).collect();
    serde_json::to_string_pretty(&entries)
}
