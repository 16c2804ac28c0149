// Executor Tests
// Effect application, rejection on inapplicable effects and exactly-once execution

use custody::executor::{ExecutionError, ExecutionOutcome, Executor};
use custody::identity::{ParticipantId, WalletId};
use custody::module::{
    export_genesis, init_genesis, AppModule, Context, CustodyModule, CustodyQuery, Event,
    GenesisState, GenesisWallet, Params, RejectReason, TxOutcome,
};
use custody::msg::{CastVote, Command, CreateProposal, Decision, EffectDescriptor};
use custody::proposal::{ProposalId, ProposalStatus};
use custody::storage::{encode_record, MemStore};
use custody::custody::{Authorization, CustodyRecord};
use custody::TxReceipt;

// ============================================================================
// HELPERS
// ============================================================================

fn pid(name: &str) -> ParticipantId {
    ParticipantId::parse(name).unwrap()
}

fn wallet() -> WalletId {
    WalletId::parse("W1").unwrap()
}

/// 2-of-2 wallet holding two denominations
fn setup(params: Params) -> (MemStore, CustodyModule) {
    let mut store = MemStore::new();
    let genesis = GenesisState {
        params,
        wallets: vec![GenesisWallet::unweighted(wallet(), 2, vec![pid("alice"), pid("bob")])
            .with_balance("upaxi", 500)
            .with_balance("uatom", 40)],
    };
    init_genesis(&mut store, &genesis, 0).unwrap();
    let module = CustodyModule::load(&store).unwrap();
    (store, module)
}

/// Create a proposal and have both participants approve it
fn pass(store: &mut MemStore, module: &CustodyModule, payload: EffectDescriptor) -> (ProposalId, TxReceipt) {
    let created = module
        .deliver(
            store,
            10,
            &Command::CreateProposal(CreateProposal {
                wallet: wallet(),
                creator: pid("alice"),
                payload,
                expiry_height: 100,
            }),
        )
        .unwrap();
    let id = match created.outcome() {
        Some(TxOutcome::Created { proposal_id }) => *proposal_id,
        other => panic!("Expected creation, got {:?}", other),
    };

    let mut last = None;
    for voter in ["alice", "bob"] {
        last = Some(
            module
                .deliver(
                    store,
                    11,
                    &Command::Vote(CastVote {
                        proposal_id: id,
                        voter: pid(voter),
                        decision: Decision::Approve,
                    }),
                )
                .unwrap(),
        );
    }
    (id, last.unwrap())
}

fn custody(store: &MemStore) -> CustodyRecord {
    CustodyQuery::custody(store, &wallet()).unwrap().unwrap()
}

fn authorizations(store: &MemStore) -> Vec<Authorization> {
    CustodyQuery::authorizations(store, &wallet()).unwrap()
}

fn status(store: &MemStore, id: &ProposalId) -> ProposalStatus {
    CustodyQuery::proposal(store, id).unwrap().unwrap().status()
}

fn rejection(receipt: &TxReceipt) -> Option<&RejectReason> {
    receipt.events.iter().find_map(|e| match e {
        Event::ProposalRejected { reason, .. } => Some(reason),
        _ => None,
    })
}

// ============================================================================
// STRUCTURAL EFFECTS
// ============================================================================

#[test]
fn test_add_participant_with_weight() {
    let (mut store, module) = setup(Params::default());
    let (id, _) = pass(&mut store, &module, EffectDescriptor::add_participant(&pid("carol"), 3));

    assert_eq!(status(&store, &id), ProposalStatus::Executed);
    let record = custody(&store);
    assert_eq!(record.policy().weight_of(&pid("carol")), 3);
    assert_eq!(record.policy().total_weight(), 5);
    assert_eq!(record.config_version(), 1);
    // structural changes are not spend authorizations
    assert!(authorizations(&store).is_empty());
}

#[test]
fn test_add_existing_participant_rejected() {
    let (mut store, module) = setup(Params::default());
    let (id, receipt) = pass(&mut store, &module, EffectDescriptor::add_participant(&pid("bob"), 1));

    assert_eq!(status(&store, &id), ProposalStatus::Rejected);
    assert!(matches!(
        rejection(&receipt),
        Some(RejectReason::EffectNotApplicable { .. })
    ));
    assert_eq!(custody(&store).config_version(), 0);
}

#[test]
fn test_participant_cap_enforced_at_execution() {
    let (mut store, module) = setup(Params {
        max_participants: 2,
        ..Params::default()
    });
    let (id, _) = pass(&mut store, &module, EffectDescriptor::add_participant(&pid("carol"), 1));

    assert_eq!(status(&store, &id), ProposalStatus::Rejected);
    assert!(!custody(&store).is_participant(&pid("carol")));
}

#[test]
fn test_remove_that_breaks_threshold_rejected() {
    let (mut store, module) = setup(Params::default());
    // 2-of-2 minus one participant can never reach 2
    let (id, receipt) = pass(&mut store, &module, EffectDescriptor::remove_participant(&pid("bob")));

    assert_eq!(status(&store, &id), ProposalStatus::Rejected);
    match rejection(&receipt) {
        Some(RejectReason::EffectNotApplicable { reason }) => {
            assert!(reason.contains("cannot be met"), "{}", reason)
        }
        other => panic!("Expected EffectNotApplicable, got {:?}", other),
    }
    assert!(custody(&store).is_participant(&pid("bob")));
}

#[test]
fn test_threshold_then_remove() {
    let (mut store, module) = setup(Params::default());
    let (lower, _) = pass(&mut store, &module, EffectDescriptor::change_threshold(1));
    assert_eq!(status(&store, &lower), ProposalStatus::Executed);
    assert_eq!(custody(&store).policy().threshold(), 1);

    // a fresh proposal against version 1; alice alone now suffices
    let (remove, _) = pass(&mut store, &module, EffectDescriptor::remove_participant(&pid("bob")));
    assert_eq!(status(&store, &remove), ProposalStatus::Executed);

    let record = custody(&store);
    assert!(!record.is_participant(&pid("bob")));
    assert_eq!(record.config_version(), 2);
}

#[test]
fn test_set_weight() {
    let (mut store, module) = setup(Params::default());
    let payload = EffectDescriptor::new("set_weight")
        .with_param("participant", "bob")
        .with_param("weight", "4");
    pass(&mut store, &module, payload);

    assert_eq!(custody(&store).policy().weight_of(&pid("bob")), 4);

    let payload = EffectDescriptor::new("set_weight")
        .with_param("participant", "zed")
        .with_param("weight", "4");
    let (id, _) = pass(&mut store, &module, payload);
    assert_eq!(status(&store, &id), ProposalStatus::Rejected);
}

// ============================================================================
// SPENDS AND CONTRACT ACTIONS
// ============================================================================

#[test]
fn test_send_defaults_denom_and_records_authorization() {
    let (mut store, module) = setup(Params::default());
    let payload = EffectDescriptor::new("send")
        .with_param("recipient", "shop")
        .with_param("amount", "120")
        .with_param("memo", "invoice 7");
    let (id, receipt) = pass(&mut store, &module, payload.clone());

    assert_eq!(
        receipt.events.last(),
        Some(&Event::ProposalExecuted {
            id,
            effect: payload.clone(),
        })
    );

    let record = custody(&store);
    assert_eq!(record.balance("upaxi"), 380);
    assert_eq!(record.balance("uatom"), 40);
    assert_eq!(record.config_version(), 0);

    let authorized = authorizations(&store);
    assert_eq!(authorized.len(), 1);
    assert_eq!(authorized[0].wallet, wallet());
    assert_eq!(authorized[0].effect, payload);
    assert_eq!(authorized[0].height, 11);
}

#[test]
fn test_spend_entire_balance() {
    let (mut store, module) = setup(Params::default());
    pass(&mut store, &module, EffectDescriptor::send("r", "uatom", 40));
    assert_eq!(custody(&store).balance("uatom"), 0);

    let (id, receipt) = pass(&mut store, &module, EffectDescriptor::send("r", "uatom", 1));
    assert_eq!(status(&store, &id), ProposalStatus::Rejected);
    assert_eq!(
        rejection(&receipt),
        Some(&RejectReason::InsufficientBalance {
            denom: "uatom".to_string(),
            available: 0,
            required: 1,
        })
    );
}

#[test]
fn test_contract_action_authorized_without_balance_change() {
    let (mut store, module) = setup(Params::default());
    let payload = EffectDescriptor::new("mint_token")
        .with_param("contract", "paxi1token")
        .with_param("recipient", "treasury")
        .with_param("amount", "1000");
    let (id, _) = pass(&mut store, &module, payload);

    assert_eq!(status(&store, &id), ProposalStatus::Executed);
    let record = custody(&store);
    assert_eq!(record.balance("upaxi"), 500);
    let authorized = authorizations(&store);
    assert_eq!(authorized.len(), 1);
    assert_eq!(authorized[0].proposal_id, id);
}

#[test]
fn test_custody_record_does_not_grow_with_spends() {
    let (mut store, module) = setup(Params::default());
    let encoded_len = |store: &MemStore| encode_record(&custody(store)).unwrap().len();

    let (first, _) = pass(&mut store, &module, EffectDescriptor::send("r", "upaxi", 10));
    let after_one = encoded_len(&store);
    let (second, _) = pass(&mut store, &module, EffectDescriptor::send("r", "upaxi", 10));
    let (third, _) = pass(&mut store, &module, EffectDescriptor::send("r", "upaxi", 10));

    assert_eq!(encoded_len(&store), after_one);
    assert_eq!(custody(&store).balance("upaxi"), 470);

    // the history lives in its own keyspace
    let authorized = authorizations(&store);
    let mut ids: Vec<ProposalId> = authorized.iter().map(|a| a.proposal_id).collect();
    ids.sort();
    let mut expected = vec![first, second, third];
    expected.sort();
    assert_eq!(ids, expected);
    assert_eq!(export_genesis(&store).unwrap().authorizations, authorized);
}

// ============================================================================
// EXACTLY ONCE
// ============================================================================

#[test]
fn test_execute_final_proposal_is_skipped() {
    let (mut store, module) = setup(Params::default());
    let (id, _) = pass(&mut store, &module, EffectDescriptor::send("r", "upaxi", 100));
    let before = custody(&store);

    let params = Params::default();
    let mut ctx = Context::new(12, &params, &store);
    assert_eq!(
        Executor::execute(&mut ctx, &id).unwrap(),
        ExecutionOutcome::Skipped(ProposalStatus::Executed)
    );
    let (batch, events) = ctx.finish();
    assert!(batch.is_empty());
    assert!(events.is_empty());
    assert_eq!(custody(&store), before);
}

#[test]
fn test_execute_pending_proposal_is_an_internal_error() {
    let (mut store, module) = setup(Params::default());
    let created = module
        .deliver(
            &mut store,
            10,
            &Command::CreateProposal(CreateProposal {
                wallet: wallet(),
                creator: pid("bob"),
                payload: EffectDescriptor::change_threshold(1),
                expiry_height: 100,
            }),
        )
        .unwrap();
    let id = match created.outcome() {
        Some(TxOutcome::Created { proposal_id }) => *proposal_id,
        other => panic!("Expected creation, got {:?}", other),
    };

    let params = Params::default();
    let mut ctx = Context::new(11, &params, &store);
    assert!(matches!(
        Executor::execute(&mut ctx, &id),
        Err(ExecutionError::NotApproved {
            status: ProposalStatus::Pending,
            ..
        })
    ));
}
