//! Decode-then-encode is byte-identical for every settlement wire format,
//! and decoders never panic on arbitrary input.

use polis_crypto::{ecdsa_public_key, ecdsa_sign, SecretKey};
use polis_settlement::{
    verify_multisig, AggregatedSignature, Escrow, EscrowCondition, EscrowState, MultisigPolicy,
};
use polis_types::{Address, AssetId, CompressedPubKey};
use proptest::prelude::*;

fn key(i: u8) -> CompressedPubKey {
    ecdsa_public_key(&SecretKey::from_bytes([i + 1; 32])).unwrap()
}

fn condition() -> impl Strategy<Value = EscrowCondition> {
    prop_oneof![
        any::<u64>().prop_map(|release_height| EscrowCondition::TimeLock { release_height }),
        any::<[u8; 32]>().prop_map(|digest| EscrowCondition::HashLock { digest }),
        (0u8..8).prop_map(|i| EscrowCondition::Conditional { arbiter: key(i) }),
    ]
}

fn state() -> impl Strategy<Value = EscrowState> {
    prop_oneof![
        Just(EscrowState::Funded),
        Just(EscrowState::Released),
        Just(EscrowState::Refunded),
    ]
}

fn asset() -> impl Strategy<Value = AssetId> {
    prop_oneof![Just(AssetId::Talanton), Just(AssetId::Drachma), Just(AssetId::Obolos)]
}

proptest! {
    #[test]
    fn policy_bytes_stable(n in 1u8..=15, m_seed in any::<u8>()) {
        let keys: Vec<_> = (0..n).map(key).collect();
        let m = usize::from(m_seed % n) + 1;
        let policy = MultisigPolicy::new(m, keys).unwrap();
        let bytes = policy.to_bytes();
        let decoded = MultisigPolicy::from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded.to_bytes(), bytes);
        prop_assert_eq!(decoded.policy_id(), policy.policy_id());
    }

    #[test]
    fn aggregated_bytes_stable(entries in prop::collection::vec((any::<u8>(), any::<[u8; 32]>()), 0..20)) {
        let mut agg = AggregatedSignature::new();
        for (index, half) in entries {
            let mut sig = [0u8; 64];
            sig[..32].copy_from_slice(&half);
            sig[32..].copy_from_slice(&half);
            agg.push(index, sig).unwrap();
        }
        let bytes = agg.to_bytes();
        prop_assert_eq!(AggregatedSignature::from_bytes(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn escrow_bytes_stable(
        id in any::<u64>(),
        dep in prop::collection::vec(any::<u8>(), 1..64),
        ben in prop::collection::vec(any::<u8>(), 1..64),
        asset in asset(),
        amount in 1u64..,
        condition in condition(),
        refund_after in any::<u64>(),
        state in state(),
    ) {
        let mut escrow = Escrow::new(
            id,
            Address::new(dep),
            Address::new(ben),
            asset,
            amount,
            condition,
            refund_after,
        )
        .unwrap();
        escrow.state = state;
        let bytes = escrow.to_bytes().unwrap();
        let decoded = Escrow::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&decoded, &escrow);
        prop_assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn decoders_reject_garbage_gracefully(data in prop::collection::vec(any::<u8>(), 0..300)) {
        if let Ok(p) = MultisigPolicy::from_bytes(&data) {
            prop_assert_eq!(p.to_bytes(), data.clone());
        }
        if let Ok(a) = AggregatedSignature::from_bytes(&data) {
            prop_assert_eq!(a.to_bytes(), data.clone());
        }
        if let Ok(e) = Escrow::from_bytes(&data) {
            prop_assert_eq!(e.to_bytes().unwrap(), data);
        }
    }
}

#[test]
fn three_of_five_settlement() {
    let keys: Vec<_> = (0..5).map(key).collect();
    let policy = MultisigPolicy::new(3, keys).unwrap();
    let msg = policy.policy_id();

    let mut agg = AggregatedSignature::new();
    for i in [4u8, 1, 3] {
        let sig = ecdsa_sign(&msg, &SecretKey::from_bytes([i + 1; 32])).unwrap();
        agg.push(i, sig).unwrap();
    }
    let wire = agg.to_bytes();
    let received = AggregatedSignature::from_bytes(&wire).unwrap();
    assert_eq!(verify_multisig(&policy, &msg, &received), Ok(()));
}
