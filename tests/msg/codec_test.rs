// Codec Tests
// Envelope, body and signed-transaction encodings

use custody::identity::Keypair;
use custody::msg::{
    CodecError, Decision, EffectDescriptor, MsgCreateProposal, MsgKind, MsgVote, ProposalBuilder,
    TxCodec, TxMessage, VoteBuilder, CREATE_PROPOSAL_TYPE_URL, VOTE_TYPE_URL,
};
use custody::proposal::ProposalId;

fn create_body() -> MsgCreateProposal {
    MsgCreateProposal {
        wallet: "W1".to_string(),
        creator: "alice".to_string(),
        kind: "send".to_string(),
        params: [("recipient", "bob"), ("amount", "25")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        expiry_height: 100,
    }
}

// ============================================================================
// ENVELOPES
// ============================================================================

#[test]
fn test_pack_sets_type_url() {
    let msg = TxCodec::pack_create_proposal(&create_body()).unwrap();
    assert_eq!(msg.type_url(), CREATE_PROPOSAL_TYPE_URL);
    assert_eq!(
        MsgKind::from_type_url(msg.type_url()),
        Some(MsgKind::CreateProposal)
    );

    let vote = TxCodec::pack_vote(&MsgVote {
        proposal_id: "00".repeat(32),
        voter: "bob".to_string(),
        decision: "approve".to_string(),
    })
    .unwrap();
    assert_eq!(vote.type_url(), VOTE_TYPE_URL);
}

#[test]
fn test_unpack_recovers_body() {
    let msg = TxCodec::pack_create_proposal(&create_body()).unwrap();
    let bytes = TxCodec::encode(&msg).unwrap();

    let decoded = TxCodec::decode(&bytes).unwrap();
    assert_eq!(
        TxCodec::unpack_create_proposal(&decoded).unwrap(),
        create_body()
    );
}

#[test]
fn test_trailing_bytes_rejected() {
    let msg = TxCodec::pack_create_proposal(&create_body()).unwrap();
    let mut bytes = TxCodec::encode(&msg).unwrap();
    bytes.push(0);

    assert!(matches!(
        TxCodec::decode(&bytes),
        Err(CodecError::TrailingBytes(1))
    ));
}

#[test]
fn test_truncated_input_rejected() {
    let msg = TxCodec::pack_create_proposal(&create_body()).unwrap();
    let bytes = TxCodec::encode(&msg).unwrap();

    assert!(matches!(
        TxCodec::decode(&bytes[..bytes.len() / 2]),
        Err(CodecError::DecodeError(_))
    ));
}

#[test]
fn test_wrong_body_for_type() {
    // a vote body under the create-proposal tag does not decode as one
    let vote_bytes = TxCodec::pack_vote(&MsgVote {
        proposal_id: "ab".repeat(32),
        voter: "bob".to_string(),
        decision: "reject".to_string(),
    })
    .unwrap()
    .value()
    .to_vec();
    let forged = TxMessage::new(CREATE_PROPOSAL_TYPE_URL, vote_bytes);

    assert!(TxCodec::unpack_create_proposal(&forged).is_err());
}

// ============================================================================
// SIGNED TRANSACTIONS
// ============================================================================

#[test]
fn test_signed_hex_roundtrip() {
    let keypair = Keypair::from_seed([4u8; 32]);
    let tx = ProposalBuilder::new()
        .signer(&keypair)
        .wallet("W1")
        .effect(EffectDescriptor::change_threshold(2))
        .expiry_height(40)
        .build()
        .unwrap();

    let hex = TxCodec::encode_signed_hex(&tx).unwrap();
    assert_eq!(TxCodec::decode_signed_hex(&hex).unwrap(), tx);
    // surrounding whitespace from files and shells is tolerated
    assert_eq!(
        TxCodec::decode_signed_hex(&format!(" {}\n", hex)).unwrap(),
        tx
    );
}

#[test]
fn test_invalid_hex_rejected() {
    assert!(matches!(
        TxCodec::decode_signed_hex("not-hex"),
        Err(CodecError::InvalidHex(_))
    ));
}

#[test]
fn test_base64_envelope() {
    let keypair = Keypair::from_seed([5u8; 32]);
    let tx = VoteBuilder::new()
        .signer(&keypair)
        .proposal(ProposalId::from_bytes([1u8; 32]))
        .decision(Decision::Approve)
        .build()
        .unwrap();

    let b64 = TxCodec::encode_base64(tx.msg()).unwrap();
    assert!(!b64.contains('='));
    assert_eq!(&TxCodec::decode_base64(&b64).unwrap(), tx.msg());

    assert!(matches!(
        TxCodec::decode_base64("***"),
        Err(CodecError::InvalidBase64(_))
    ));
}

#[test]
fn test_encoding_is_deterministic() {
    let a = TxCodec::encode(&TxCodec::pack_create_proposal(&create_body()).unwrap()).unwrap();
    let b = TxCodec::encode(&TxCodec::pack_create_proposal(&create_body()).unwrap()).unwrap();
    assert_eq!(a, b);
}
