// Module scenario tests
// A three-participant 2-of-3 wallet driven through the keeper end to end

use custody::identity::{ParticipantId, WalletId};
use custody::module::{
    dispatch, init_genesis, AppModule, Context, CustodyModule, CustodyQuery, DeliverResult,
    ErrorKind, Event, GenesisState, GenesisWallet, Params, RejectReason, TxOutcome,
    CODE_DUPLICATE_VOTE, CODE_PROPOSAL_NOT_PENDING,
};
use custody::msg::{CastVote, Command, CreateProposal, Decision, EffectDescriptor};
use custody::proposal::{ProposalId, ProposalStatus};
use custody::quorum::Tally;
use custody::storage::MemStore;
use custody::TxReceipt;

// ============================================================================
// HELPERS
// ============================================================================

fn pid(name: &str) -> ParticipantId {
    ParticipantId::parse(name).unwrap()
}

fn w1() -> WalletId {
    WalletId::parse("W1").unwrap()
}

/// W1 = {A, B, C}, threshold 2, 1000 upaxi
fn setup() -> (MemStore, CustodyModule) {
    let mut store = MemStore::new();
    let genesis = GenesisState {
        params: Params::default(),
        wallets: vec![
            GenesisWallet::unweighted(w1(), 2, vec![pid("A"), pid("B"), pid("C")])
                .with_balance("upaxi", 1_000),
        ],
    };
    init_genesis(&mut store, &genesis, 0).unwrap();
    let module = CustodyModule::load(&store).unwrap();
    (store, module)
}

fn create(creator: &str, payload: EffectDescriptor, expiry_height: u64) -> Command {
    Command::CreateProposal(CreateProposal {
        wallet: w1(),
        creator: pid(creator),
        payload,
        expiry_height,
    })
}

fn vote(id: ProposalId, voter: &str, decision: Decision) -> Command {
    Command::Vote(CastVote {
        proposal_id: id,
        voter: pid(voter),
        decision,
    })
}

fn spend() -> EffectDescriptor {
    EffectDescriptor::send("recipient-1", "upaxi", 250)
}

fn created_id(receipt: &TxReceipt) -> ProposalId {
    match receipt.outcome() {
        Some(TxOutcome::Created { proposal_id }) => *proposal_id,
        other => panic!("Expected a created proposal, got {:?}", other),
    }
}

fn status_of(store: &MemStore, id: &ProposalId) -> ProposalStatus {
    CustodyQuery::proposal(store, id).unwrap().unwrap().status()
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// A creates P1 at height 10 with expiry 100
#[test]
fn test_create_proposal_is_pending() {
    let (mut store, module) = setup();

    let receipt = module
        .deliver(&mut store, 10, &create("A", spend(), 100))
        .unwrap();
    let p1 = created_id(&receipt);

    assert_eq!(
        receipt.events,
        vec![Event::ProposalCreated {
            id: p1,
            wallet: w1(),
            creator: pid("A"),
            expiry_height: 100,
        }]
    );
    assert_eq!(status_of(&store, &p1), ProposalStatus::Pending);
}

/// B approves at height 11: one of two, still reachable
#[test]
fn test_single_approval_stays_pending() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());

    let receipt = module
        .deliver(&mut store, 11, &vote(p1, "B", Decision::Approve))
        .unwrap();

    assert_eq!(
        receipt.outcome(),
        Some(&TxOutcome::Voted {
            proposal_id: p1,
            tally: Tally::new(1, 0, 3),
            status: ProposalStatus::Pending,
        })
    );
    assert_eq!(status_of(&store, &p1), ProposalStatus::Pending);
}

/// C approves at height 12: quorum reached, executed in the same transaction
#[test]
fn test_quorum_executes_and_updates_custody() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());
    module
        .deliver(&mut store, 11, &vote(p1, "B", Decision::Approve))
        .unwrap();

    let receipt = module
        .deliver(&mut store, 12, &vote(p1, "C", Decision::Approve))
        .unwrap();

    assert_eq!(receipt.events.len(), 2);
    assert!(matches!(
        receipt.events[0],
        Event::VoteRecorded { tally: Tally { approve: 2, reject: 0, total: 3 }, .. }
    ));
    assert_eq!(
        receipt.events[1],
        Event::ProposalExecuted {
            id: p1,
            effect: spend(),
        }
    );
    assert_eq!(status_of(&store, &p1), ProposalStatus::Executed);

    let record = CustodyQuery::custody(&store, &w1()).unwrap().unwrap();
    assert_eq!(record.balance("upaxi"), 750);
    let authorized = CustodyQuery::authorizations(&store, &w1()).unwrap();
    assert_eq!(authorized.len(), 1);
    assert_eq!(authorized[0].proposal_id, p1);
    assert_eq!(record.updated_height(), 12);
}

/// A votes after execution: ProposalNotPending, nothing committed
#[test]
fn test_vote_after_execution_is_not_pending() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());
    module
        .deliver(&mut store, 11, &vote(p1, "B", Decision::Approve))
        .unwrap();
    module
        .deliver(&mut store, 12, &vote(p1, "C", Decision::Approve))
        .unwrap();
    let before = store.clone();

    let receipt = module
        .deliver(&mut store, 13, &vote(p1, "A", Decision::Reject))
        .unwrap();

    match &receipt.result {
        DeliverResult::Failed { code, kind, .. } => {
            assert_eq!(*code, CODE_PROPOSAL_NOT_PENDING);
            assert_eq!(*kind, ErrorKind::Precondition);
        }
        other => panic!("Expected failure, got {:?}", other),
    }
    assert!(receipt.events.is_empty());
    assert_eq!(store, before);
}

/// P2 created at 50 expiring at 60; a vote at 61 expires it without counting
#[test]
fn test_late_vote_expires_proposal() {
    let (mut store, module) = setup();
    let p2 = created_id(&module.deliver(&mut store, 50, &create("A", spend(), 60)).unwrap());

    let receipt = module
        .deliver(&mut store, 61, &vote(p2, "B", Decision::Approve))
        .unwrap();

    assert!(receipt.is_committed());
    assert_eq!(
        receipt.outcome(),
        Some(&TxOutcome::Expired { proposal_id: p2 })
    );
    assert_eq!(receipt.events, vec![Event::ProposalExpired { id: p2 }]);
    assert_eq!(status_of(&store, &p2), ProposalStatus::Expired);
    assert!(CustodyQuery::votes(&store, &p2).unwrap().is_empty());

    // terminal now: the next vote is simply not pending
    let receipt = module
        .deliver(&mut store, 62, &vote(p2, "C", Decision::Approve))
        .unwrap();
    assert_eq!(receipt.code(), CODE_PROPOSAL_NOT_PENDING);
}

/// Dispatch reports the late vote as a lifecycle error and keeps the expiry
/// writes; the keeper turns that into a committed outcome
#[test]
fn test_expiry_is_a_lifecycle_error_below_the_keeper() {
    let (mut store, module) = setup();
    let p2 = created_id(&module.deliver(&mut store, 50, &create("A", spend(), 60)).unwrap());

    let params = Params::default();
    let mut ctx = Context::new(61, &params, &store);
    let err = dispatch(&mut ctx, &vote(p2, "B", Decision::Approve)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert_eq!(
        err.lifecycle_outcome(),
        Some(TxOutcome::Expired { proposal_id: p2 })
    );

    let (batch, events) = ctx.finish();
    assert!(!batch.is_empty());
    assert_eq!(events, vec![Event::ProposalExpired { id: p2 }]);
}

/// The expiry height itself is still open for voting
#[test]
fn test_vote_at_expiry_height_counts() {
    let (mut store, module) = setup();
    let p2 = created_id(&module.deliver(&mut store, 50, &create("A", spend(), 60)).unwrap());

    let receipt = module
        .deliver(&mut store, 60, &vote(p2, "B", Decision::Approve))
        .unwrap();
    assert!(matches!(receipt.outcome(), Some(TxOutcome::Voted { .. })));
}

/// B votes twice: second is DuplicateVote and the tally keeps the first
#[test]
fn test_duplicate_vote_keeps_first() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());
    module
        .deliver(&mut store, 11, &vote(p1, "B", Decision::Approve))
        .unwrap();

    let receipt = module
        .deliver(&mut store, 12, &vote(p1, "B", Decision::Reject))
        .unwrap();
    assert_eq!(receipt.code(), CODE_DUPLICATE_VOTE);

    let tally = CustodyQuery::tally(&store, &p1).unwrap().unwrap();
    assert_eq!(tally.tally, Tally::new(1, 0, 3));
    assert_eq!(status_of(&store, &p1), ProposalStatus::Pending);
}

// ============================================================================
// FURTHER LIFECYCLE PATHS
// ============================================================================

#[test]
fn test_two_rejections_make_quorum_unreachable() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());
    module
        .deliver(&mut store, 11, &vote(p1, "B", Decision::Reject))
        .unwrap();

    let receipt = module
        .deliver(&mut store, 12, &vote(p1, "C", Decision::Reject))
        .unwrap();

    assert_eq!(
        receipt.events.last(),
        Some(&Event::ProposalRejected {
            id: p1,
            reason: RejectReason::QuorumUnreachable,
        })
    );
    assert_eq!(status_of(&store, &p1), ProposalStatus::Rejected);
    assert!(CustodyQuery::pending(&store, &w1(), 12).unwrap().is_empty());

    // custody untouched
    let record = CustodyQuery::custody(&store, &w1()).unwrap().unwrap();
    assert_eq!(record.balance("upaxi"), 1_000);
}

#[test]
fn test_structural_change_makes_inflight_proposal_stale() {
    let (mut store, module) = setup();
    let p1 = created_id(&module.deliver(&mut store, 10, &create("A", spend(), 100)).unwrap());
    let p2 = created_id(
        &module
            .deliver(
                &mut store,
                10,
                &create("B", EffectDescriptor::add_participant(&pid("D"), 1), 100),
            )
            .unwrap(),
    );

    // P2 executes first and bumps the configuration
    module
        .deliver(&mut store, 11, &vote(p2, "A", Decision::Approve))
        .unwrap();
    module
        .deliver(&mut store, 11, &vote(p2, "C", Decision::Approve))
        .unwrap();
    assert_eq!(status_of(&store, &p2), ProposalStatus::Executed);

    module
        .deliver(&mut store, 12, &vote(p1, "B", Decision::Approve))
        .unwrap();
    let receipt = module
        .deliver(&mut store, 12, &vote(p1, "C", Decision::Approve))
        .unwrap();

    // lifecycle outcome: committed, rejected with a reason
    assert!(receipt.is_committed());
    assert_eq!(
        receipt.events.last(),
        Some(&Event::ProposalRejected {
            id: p1,
            reason: RejectReason::StaleCustodyState {
                expected: 0,
                found: 1,
            },
        })
    );
    assert_eq!(status_of(&store, &p1), ProposalStatus::Rejected);

    let record = CustodyQuery::custody(&store, &w1()).unwrap().unwrap();
    assert!(record.is_participant(&pid("D")));
    assert_eq!(record.balance("upaxi"), 1_000);
}

#[test]
fn test_new_participant_only_votes_on_later_proposals() {
    let (mut store, module) = setup();
    let add = created_id(
        &module
            .deliver(
                &mut store,
                10,
                &create("A", EffectDescriptor::add_participant(&pid("D"), 1), 100),
            )
            .unwrap(),
    );
    module
        .deliver(&mut store, 11, &vote(add, "A", Decision::Approve))
        .unwrap();
    module
        .deliver(&mut store, 11, &vote(add, "B", Decision::Approve))
        .unwrap();

    // D can now create and vote on fresh proposals
    let p = created_id(&module.deliver(&mut store, 12, &create("D", spend(), 100)).unwrap());
    let receipt = module
        .deliver(&mut store, 13, &vote(p, "D", Decision::Approve))
        .unwrap();
    assert_eq!(
        receipt.outcome(),
        Some(&TxOutcome::Voted {
            proposal_id: p,
            tally: Tally::new(1, 0, 4),
            status: ProposalStatus::Pending,
        })
    );
}

#[test]
fn test_overspend_is_rejected_at_execution() {
    let (mut store, module) = setup();
    let p = created_id(
        &module
            .deliver(
                &mut store,
                10,
                &create("A", EffectDescriptor::send("r", "upaxi", 5_000), 100),
            )
            .unwrap(),
    );
    module
        .deliver(&mut store, 11, &vote(p, "A", Decision::Approve))
        .unwrap();
    let receipt = module
        .deliver(&mut store, 11, &vote(p, "B", Decision::Approve))
        .unwrap();

    assert_eq!(
        receipt.events.last(),
        Some(&Event::ProposalRejected {
            id: p,
            reason: RejectReason::InsufficientBalance {
                denom: "upaxi".to_string(),
                available: 1_000,
                required: 5_000,
            },
        })
    );
    assert_eq!(status_of(&store, &p), ProposalStatus::Rejected);
}

#[test]
fn test_precondition_failures_commit_nothing() {
    let (mut store, module) = setup();
    let before = store.clone();

    let outsider = module
        .deliver(&mut store, 10, &create("Z", spend(), 100))
        .unwrap();
    assert_eq!(
        outsider.result,
        DeliverResult::Failed {
            code: custody::module::CODE_NOT_A_PARTICIPANT,
            kind: ErrorKind::Precondition,
            message: "Z is not a participant of wallet W1".to_string(),
        }
    );

    let past = module
        .deliver(&mut store, 10, &create("A", spend(), 10))
        .unwrap();
    assert_eq!(past.code(), custody::module::CODE_INVALID_EXPIRY);

    let unknown = module
        .deliver(
            &mut store,
            10,
            &vote(ProposalId::from_bytes([9u8; 32]), "A", Decision::Approve),
        )
        .unwrap();
    assert_eq!(unknown.code(), custody::module::CODE_PROPOSAL_NOT_FOUND);

    assert_eq!(store, before);
}
