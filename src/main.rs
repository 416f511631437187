// Steward CLI entry point

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use steward::feed::proposal_feed;
use steward::{Request, Response, Steward, StewardService};
use steward_config::StewardConfig;
use steward_core::{PrincipalId, Timestamp, VoteChoice};
use steward_governance::Proposal;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Steward governance and treasury")]
struct Cli {
    /// YAML configuration file (defaults to STEWARD_CONFIG_FILE and STEWARD_* variables)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[clap(long)]
    data_dir: Option<String>,

    /// Principal the command is issued as
    #[clap(long = "as", default_value = "anonymous")]
    caller: String,

    /// Log level used when RUST_LOG is not set
    #[clap(long)]
    log_level: Option<String>,

    /// Print responses as JSON
    #[clap(long)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Voting weight operations
    Weight {
        #[clap(subcommand)]
        command: WeightCommands,
    },

    /// Proposal operations
    Proposal {
        #[clap(subcommand)]
        command: ProposalCommands,
    },

    /// Treasury operations
    Treasury {
        #[clap(subcommand)]
        command: TreasuryCommands,
    },

    /// Print notification records
    Events {
        /// First sequence number to print
        #[clap(short, long, default_value = "0")]
        from: u64,

        /// Maximum number of records
        #[clap(short, long, default_value = "100")]
        limit: usize,
    },

    /// Write the proposal feed read by off-chain agents
    ExportProposals {
        /// Output file
        #[clap(short, long, default_value = "proposals.json")]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum WeightCommands {
    /// Set a principal's voting weight (admin)
    Set { principal: String, weight: u64 },
    /// Show a principal's voting weight
    Get { principal: String },
    /// List all weights
    List,
}

#[derive(Subcommand, Debug)]
enum ProposalCommands {
    /// Open a proposal
    Create {
        #[clap(short, long)]
        title: String,
        #[clap(short, long, default_value = "")]
        description: String,
    },
    /// Vote on a proposal: for|against|abstain or 1|2|3
    Vote { id: u64, choice: VoteChoice },
    /// Execute a proposal after its deadline
    Execute { id: u64 },
    /// Show a proposal
    Show { id: u64 },
    /// Whether a principal voted on a proposal
    HasVoted { id: u64, principal: String },
    /// List proposals
    List,
    /// List the votes cast on a proposal
    Votes { id: u64 },
    /// Check whether a proposal would execute now
    Outcome { id: u64 },
    /// Show quorum and voting period
    Policy,
}

#[derive(Subcommand, Debug)]
enum TreasuryCommands {
    /// Deposit funds
    Deposit { amount: u64 },
    /// Transfer funds (agent)
    Transfer { to: String, amount: u64 },
    /// Vote on a ledger through the treasury (agent)
    ProxyVote {
        id: u64,
        choice: VoteChoice,
        /// Target ledger; defaults to the governance ledger
        #[clap(short, long)]
        ledger: Option<String>,
    },
    /// Replace the daily spend limit (governance)
    SetLimit { limit: u64 },
    /// Pause transfers and proxied votes (emergency admin)
    Pause,
    /// Resume transfers and proxied votes (emergency admin)
    Unpause,
    /// Show what can still be spent today
    Allowance,
    /// Show balance, limit, window and pause flag
    Status,
    /// List votes cast through the treasury
    ProxiedVotes,
}

fn load_config(cli: &Cli) -> Result<StewardConfig> {
    let mut config = match &cli.config {
        Some(path) => StewardConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StewardConfig::from_env()?,
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    Ok(config)
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn to_request(command: &Commands, default_ledger: &str) -> Option<Request> {
    let request = match command {
        Commands::Weight { command } => match command {
            WeightCommands::Set { principal, weight } => Request::SetWeight {
                principal: PrincipalId::new(principal.as_str()),
                weight: *weight,
            },
            WeightCommands::Get { principal } => Request::GetWeight {
                principal: PrincipalId::new(principal.as_str()),
            },
            WeightCommands::List => Request::ListWeights,
        },
        Commands::Proposal { command } => match command {
            ProposalCommands::Create { title, description } => Request::CreateProposal {
                title: title.clone(),
                description: description.clone(),
            },
            ProposalCommands::Vote { id, choice } => Request::CastVote {
                proposal_id: *id,
                choice: *choice,
            },
            ProposalCommands::Execute { id } => Request::ExecuteProposal { proposal_id: *id },
            ProposalCommands::Show { id } => Request::GetProposal { proposal_id: *id },
            ProposalCommands::HasVoted { id, principal } => Request::HasVoted {
                proposal_id: *id,
                principal: PrincipalId::new(principal.as_str()),
            },
            ProposalCommands::List => Request::ListProposals,
            ProposalCommands::Votes { id } => Request::ListVotes { proposal_id: *id },
            ProposalCommands::Outcome { id } => Request::Outcome { proposal_id: *id },
            ProposalCommands::Policy => Request::Policy,
        },
        Commands::Treasury { command } => match command {
            TreasuryCommands::Deposit { amount } => Request::Deposit { amount: *amount },
            TreasuryCommands::Transfer { to, amount } => Request::Transfer {
                to: PrincipalId::new(to.as_str()),
                amount: *amount,
            },
            TreasuryCommands::ProxyVote { id, choice, ledger } => Request::CastVoteProxy {
                ledger: ledger.clone().unwrap_or_else(|| default_ledger.to_string()),
                proposal_id: *id,
                choice: *choice,
            },
            TreasuryCommands::SetLimit { limit } => Request::UpdateSpendLimit { limit: *limit },
            TreasuryCommands::Pause => Request::Pause,
            TreasuryCommands::Unpause => Request::Unpause,
            TreasuryCommands::Allowance => Request::RemainingDailyAllowance,
            TreasuryCommands::Status => Request::TreasuryState,
            TreasuryCommands::ProxiedVotes => Request::ProxiedVotes,
        },
        Commands::Events { from, limit } => Request::ReadNotifications {
            from: *from,
            limit: *limit,
        },
        Commands::ExportProposals { .. } => return None,
    };
    Some(request)
}

fn print_proposal(proposal: &Proposal) {
    println!("Proposal #{}: {}", proposal.id, proposal.title);
    println!("  Proposer:  {}", proposal.proposer);
    println!("  Created:   {}", format_time(proposal.created_at));
    println!("  Deadline:  {}", format_time(proposal.deadline));
    println!(
        "  Votes:     {} for / {} against / {} abstain",
        proposal.tally.votes_for, proposal.tally.votes_against, proposal.tally.votes_abstain
    );
    println!("  Executed:  {}", proposal.executed);
    if !proposal.description.is_empty() {
        println!("  {}", proposal.description);
    }
}

fn print_response(response: &Response) {
    match response {
        Response::WeightSet { principal, weight, previous } => {
            println!("Weight of {} set to {} (was {})", principal, weight, previous);
        }
        Response::Weight { principal, weight } => println!("{}: {}", principal, weight),
        Response::Weights(weights) => {
            if weights.is_empty() {
                println!("No weights assigned");
            }
            for (principal, weight) in weights {
                println!("{:<30} {:>12}", principal, weight);
            }
        }
        Response::ProposalCreated { proposal_id } => println!("Created proposal #{}", proposal_id),
        Response::VoteCast(vote) => println!(
            "{} voted {} on proposal #{} with weight {}",
            vote.voter, vote.choice, vote.proposal_id, vote.weight
        ),
        Response::Executed(result) => println!(
            "Executed: {} for / {} against / {} abstain (quorum {})",
            result.votes_for, result.votes_against, result.votes_abstain, result.quorum
        ),
        Response::Proposal(proposal) => print_proposal(proposal),
        Response::HasVoted { proposal_id, principal, voted } => {
            println!("{} voted on proposal #{}: {}", principal, proposal_id, voted);
        }
        Response::Proposals(proposals) => {
            if proposals.is_empty() {
                println!("No proposals");
            } else {
                println!("{:<6} {:<40} {:>10} {:>10} {:>10} {:<8}", "ID", "Title", "For", "Against", "Abstain", "Executed");
                println!("{:-<6} {:-<40} {:->10} {:->10} {:->10} {:-<8}", "", "", "", "", "", "");
                for p in proposals {
                    println!(
                        "{:<6} {:<40} {:>10} {:>10} {:>10} {:<8}",
                        p.id, p.title, p.tally.votes_for, p.tally.votes_against, p.tally.votes_abstain, p.executed
                    );
                }
            }
        }
        Response::Votes(votes) => {
            for vote in votes {
                println!(
                    "{:<30} {:<8} {:>12} {}",
                    vote.voter,
                    vote.choice,
                    vote.weight,
                    format_time(vote.cast_at)
                );
            }
        }
        Response::Outcome(result) => println!(
            "Would execute: {} for / {} against / {} abstain, total {} of quorum {}",
            result.votes_for, result.votes_against, result.votes_abstain, result.total_votes, result.quorum
        ),
        Response::Policy { quorum, voting_period } => {
            println!("Quorum: {}", quorum);
            println!("Voting period: {}s", voting_period);
        }
        Response::Balance { balance } => println!("Balance: {}", balance),
        Response::Transferred(state) => println!(
            "Transferred. Balance {}, spent today {} of {}",
            state.balance, state.window.spent_today, state.daily_spend_limit
        ),
        Response::VoteProxied(vote) => println!(
            "Voted {} on proposal #{} of {}",
            vote.choice, vote.proposal_id, vote.ledger
        ),
        Response::SpendLimitUpdated { previous, limit } => {
            println!("Daily spend limit changed from {} to {}", previous, limit);
        }
        Response::Paused { paused } => {
            println!("Treasury {}", if *paused { "paused" } else { "unpaused" });
        }
        Response::Allowance { remaining } => println!("Remaining today: {}", remaining),
        Response::TreasuryState(state) => {
            println!("Balance:       {}", state.balance);
            println!("Daily limit:   {}", state.daily_spend_limit);
            println!("Spent today:   {}", state.window.spent_today);
            println!("Window start:  {}", format_time(state.window.last_reset_time));
            println!("Paused:        {}", state.paused);
        }
        Response::ProxiedVotes(votes) => {
            if votes.is_empty() {
                println!("No proxied votes");
            }
            for vote in votes {
                println!(
                    "{:<20} #{:<6} {:<8} {}",
                    vote.ledger,
                    vote.proposal_id,
                    vote.choice,
                    format_time(vote.cast_at)
                );
            }
        }
        Response::Notifications(records) => {
            for record in records {
                let body = serde_json::to_string(&record.notification).unwrap_or_default();
                println!(
                    "{:>8} {} {:<20} {}",
                    record.sequence,
                    format_time(record.timestamp),
                    record.notification.name(),
                    body
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    steward_core::init_tracing(&config.log_level)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;

    let default_ledger = config.governance.ledger_name.clone();
    let steward = Steward::open(config).await.context("opening steward state")?;
    let service = StewardService::new(Arc::new(steward));
    let caller = PrincipalId::new(cli.caller.as_str());

    if let Commands::ExportProposals { output } = &cli.command {
        let proposals = service.steward().ledger().list_proposals().await;
        let feed = proposal_feed(&proposals)?;
        tokio::fs::write(output, feed)
            .await
            .with_context(|| format!("writing {}", output.display()))?;
        println!("Exported {} proposals to {}", proposals.len(), output.display());
        return Ok(());
    }

    let request = match to_request(&cli.command, &default_ledger) {
        Some(request) => request,
        None => return Ok(()),
    };

    match service.handle(&caller, request).await {
        Ok(response) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
            Ok(())
        }
        Err(e) => {
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(kind.to_string()))
        }
    }
}
