// Key layout for the custody stores
//
// Variable-length segments that are followed by another segment carry a
// 2-byte big-endian length so that one wallet's prefix never matches another.

pub const PARAMS: &[u8] = b"custody:params";
pub const CUSTODY_PREFIX: &[u8] = b"custody:wallet:";
pub const PROPOSAL_PREFIX: &[u8] = b"custody:proposal:";
pub const VOTE_PREFIX: &[u8] = b"custody:vote:";
pub const PENDING_PREFIX: &[u8] = b"custody:pending:";
pub const AUTH_PREFIX: &[u8] = b"custody:auth:";

fn push_segment(key: &mut Vec<u8>, segment: &[u8]) {
    // identifiers are capped well below u16::MAX
    key.extend_from_slice(&(segment.len() as u16).to_be_bytes());
    key.extend_from_slice(segment);
}

pub fn custody_key(wallet: &str) -> Vec<u8> {
    [CUSTODY_PREFIX, wallet.as_bytes()].concat()
}

pub fn proposal_key(proposal_id: &[u8; 32]) -> Vec<u8> {
    [PROPOSAL_PREFIX, proposal_id.as_slice()].concat()
}

pub fn votes_prefix(proposal_id: &[u8; 32]) -> Vec<u8> {
    [VOTE_PREFIX, proposal_id.as_slice()].concat()
}

pub fn vote_key(proposal_id: &[u8; 32], voter: &str) -> Vec<u8> {
    [votes_prefix(proposal_id).as_slice(), voter.as_bytes()].concat()
}

pub fn pending_prefix(wallet: &str) -> Vec<u8> {
    let mut key = PENDING_PREFIX.to_vec();
    push_segment(&mut key, wallet.as_bytes());
    key
}

pub fn pending_key(wallet: &str, proposal_id: &[u8; 32]) -> Vec<u8> {
    let mut key = pending_prefix(wallet);
    key.extend_from_slice(proposal_id);
    key
}

pub fn authorizations_prefix(wallet: &str) -> Vec<u8> {
    let mut key = AUTH_PREFIX.to_vec();
    push_segment(&mut key, wallet.as_bytes());
    key
}

/// Ordered by execution height, then proposal id
pub fn authorization_key(wallet: &str, height: u64, proposal_id: &[u8; 32]) -> Vec<u8> {
    let mut key = authorizations_prefix(wallet);
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(proposal_id);
    key
}
