use std::error::Error;
use std::sync::Arc;
use tempfile::tempdir;

use steward::feed::proposal_feed;
use steward::{Request, Response, Steward, StewardService};
use steward_config::StewardConfig;
use steward_core::{FileStorage, ManualClock, PrincipalId, Storage, VoteChoice};
use steward_treasury::DirectDisburser;

const START: u64 = 1_700_000_000;

async fn open_service(data_dir: &std::path::Path, quorum: u64) -> Result<StewardService, Box<dyn Error>> {
    let mut config = StewardConfig::default();
    config.data_dir = data_dir.display().to_string();
    config.governance.quorum = quorum;
    config.treasury.daily_spend_limit = 100;

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir).await?);
    let steward = Steward::with_parts(
        config,
        storage,
        Arc::new(ManualClock::new(START)),
        Arc::new(DirectDisburser::new()),
    )
    .await?;

    Ok(StewardService::new(Arc::new(steward)))
}

fn p(id: &str) -> PrincipalId {
    PrincipalId::new(id)
}

async fn snapshot(service: &StewardService) -> Result<Vec<Response>, Box<dyn Error>> {
    let mut responses = Vec::new();
    for request in [
        Request::ListWeights,
        Request::ListProposals,
        Request::ListVotes { proposal_id: 0 },
        Request::TreasuryState,
        Request::ProxiedVotes,
        Request::Policy,
        Request::ReadNotifications { from: 0, limit: 1_000 },
    ] {
        responses.push(service.handle(&p("observer"), request).await?);
    }
    Ok(responses)
}

#[tokio::test]
async fn test_state_survives_restart() -> Result<(), Box<dyn Error>> {
    let temp_dir = tempdir()?;

    let before = {
        let service = open_service(temp_dir.path(), 30).await?;
        for (principal, weight) in [("alice", 40), ("bob smith", 10), ("treasury", 5)] {
            service
                .handle(&p("admin"), Request::SetWeight { principal: p(principal), weight })
                .await?;
        }

        service
            .handle(
                &p("alice"),
                Request::CreateProposal {
                    title: "Community garden".to_string(),
                    description: "Seeds and tools".to_string(),
                },
            )
            .await?;
        service
            .handle(&p("alice"), Request::CastVote { proposal_id: 0, choice: VoteChoice::For })
            .await?;
        service
            .handle(&p("bob smith"), Request::CastVote { proposal_id: 0, choice: VoteChoice::Against })
            .await?;

        service.handle(&p("donor"), Request::Deposit { amount: 500 }).await?;
        service
            .handle(&p("agent"), Request::Transfer { to: p("vendor"), amount: 60 })
            .await?;
        service
            .handle(
                &p("agent"),
                Request::CastVoteProxy {
                    ledger: "governance".to_string(),
                    proposal_id: 0,
                    choice: VoteChoice::Abstain,
                },
            )
            .await?;
        service.handle(&p("emergency-admin"), Request::Pause).await?;

        snapshot(&service).await?
    };

    // A different configured quorum does not override the stored policy
    let service = open_service(temp_dir.path(), 999).await?;
    let after = snapshot(&service).await?;
    assert_eq!(before, after);

    match service
        .handle(&p("alice"), Request::HasVoted { proposal_id: 0, principal: p("bob smith") })
        .await?
    {
        Response::HasVoted { voted, .. } => assert!(voted),
        other => panic!("unexpected response {:?}", other),
    }

    // Sequence numbers continue after the last persisted record
    let response = service.handle(&p("donor"), Request::Deposit { amount: 1 }).await?;
    assert_eq!(response, Response::Balance { balance: 441 });
    let records = service.steward().log().read(0, 1_000).await?;
    assert_eq!(records.len(), 12);
    assert_eq!(records.last().map(|r| r.sequence), Some(11));

    let next = service
        .handle(
            &p("alice"),
            Request::CreateProposal { title: "Second".to_string(), description: String::new() },
        )
        .await?;
    assert_eq!(next, Response::ProposalCreated { proposal_id: 1 });

    Ok(())
}

#[tokio::test]
async fn test_exported_feed_matches_ledger() -> Result<(), Box<dyn Error>> {
    let temp_dir = tempdir()?;
    let service = open_service(temp_dir.path(), 30).await?;

    service
        .handle(&p("admin"), Request::SetWeight { principal: p("alice"), weight: 40 })
        .await?;
    service
        .handle(
            &p("alice"),
            Request::CreateProposal { title: "Tools".to_string(), description: "d".to_string() },
        )
        .await?;
    service
        .handle(&p("alice"), Request::CastVote { proposal_id: 0, choice: VoteChoice::For })
        .await?;

    let proposals = service.steward().ledger().list_proposals().await;
    let feed: serde_json::Value = serde_json::from_str(&proposal_feed(&proposals)?)?;

    assert_eq!(feed[0]["id"], 0);
    assert_eq!(feed[0]["proposer"], "alice");
    assert_eq!(feed[0]["votesFor"], 40);
    assert_eq!(feed[0]["votesAgainst"], 0);
    assert_eq!(feed[0]["executed"], false);

    Ok(())
}

#[tokio::test]
async fn test_nested_principal_ids_survive_restart() -> Result<(), Box<dyn Error>> {
    let temp_dir = tempdir()?;
    let mut config = StewardConfig::default();
    config.data_dir = temp_dir.path().display().to_string();
    config.sync_writes = false;

    {
        let service = StewardService::new(Arc::new(Steward::open(config.clone()).await?));
        for (principal, weight) in [("org", 5), ("org/treasurer", 7)] {
            service
                .handle(&p("admin"), Request::SetWeight { principal: p(principal), weight })
                .await?;
        }
        service
            .handle(
                &p("org"),
                Request::CreateProposal { title: "Payroll".to_string(), description: String::new() },
            )
            .await?;
        for voter in ["org", "org/treasurer"] {
            service
                .handle(&p(voter), Request::CastVote { proposal_id: 0, choice: VoteChoice::For })
                .await?;
        }
    }

    let service = StewardService::new(Arc::new(Steward::open(config).await?));
    assert_eq!(
        service.handle(&p("observer"), Request::ListWeights).await?,
        Response::Weights(vec![(p("org"), 5), (p("org/treasurer"), 7)])
    );
    match service.handle(&p("observer"), Request::ListVotes { proposal_id: 0 }).await? {
        Response::Votes(votes) => {
            let voters: Vec<_> = votes.into_iter().map(|v| v.voter).collect();
            assert_eq!(voters, vec![p("org"), p("org/treasurer")]);
        }
        other => panic!("unexpected response {:?}", other),
    }

    Ok(())
}
