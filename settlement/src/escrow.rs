//! Conditional escrows.
//!
//! An escrow is created `Funded` and ends either `Released` to the
//! beneficiary, once its condition is satisfied, or `Refunded` to the
//! depositor, once `refund_after` has passed.
//!
//! Wire format (all integers little-endian):
//!
//! ```text
//! [id u64][dep_len u8][depositor][ben_len u8][beneficiary][asset u8][amount u64]
//! [cond_tag u8][cond payload][refund_after u64][state u8]
//! ```
//!
//! Condition payloads: time lock `release_height u64` (tag 0), hash lock
//! `sha256 digest 32` (tag 1), arbiter `compressed key 33` (tag 2).

use std::collections::BTreeMap;

use polis_crypto::{ecdsa_verify, sha256};
use polis_types::{Address, AssetId, BlockHeight, CompressedPubKey};
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

const TAG_TIME_LOCK: u8 = 0;
const TAG_HASH_LOCK: u8 = 1;
const TAG_CONDITIONAL: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowCondition {
    /// Releasable from `release_height` on.
    TimeLock { release_height: BlockHeight },
    /// Releasable by revealing a preimage of `digest` under SHA-256.
    HashLock { digest: [u8; 32] },
    /// Releasable by the arbiter's signature over [`Escrow::release_message`].
    Conditional { arbiter: CompressedPubKey },
}

impl EscrowCondition {
    fn tag(&self) -> u8 {
        match self {
            Self::TimeLock { .. } => TAG_TIME_LOCK,
            Self::HashLock { .. } => TAG_HASH_LOCK,
            Self::Conditional { .. } => TAG_CONDITIONAL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    Funded,
    Released,
    Refunded,
}

impl EscrowState {
    fn tag(&self) -> u8 {
        match self {
            Self::Funded => 0,
            Self::Released => 1,
            Self::Refunded => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Funded),
            1 => Some(Self::Released),
            2 => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Evidence offered when releasing an escrow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseWitness {
    /// Time locks need nothing but the block height.
    None,
    Preimage(Vec<u8>),
    ArbiterSignature([u8; 64]),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    pub id: u64,
    pub depositor: Address,
    pub beneficiary: Address,
    pub asset: AssetId,
    pub amount: u64,
    pub condition: EscrowCondition,
    pub refund_after: BlockHeight,
    pub state: EscrowState,
}

fn check_address(address: &Address) -> Result<u8, SettlementError> {
    if address.is_empty() {
        return Err(SettlementError::EmptyAddress);
    }
    u8::try_from(address.len()).map_err(|_| SettlementError::AddressTooLong(address.len()))
}

impl Escrow {
    pub fn new(
        id: u64,
        depositor: Address,
        beneficiary: Address,
        asset: AssetId,
        amount: u64,
        condition: EscrowCondition,
        refund_after: BlockHeight,
    ) -> Result<Self, SettlementError> {
        check_address(&depositor)?;
        check_address(&beneficiary)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        Ok(Self {
            id,
            depositor,
            beneficiary,
            asset,
            amount,
            condition,
            refund_after,
            state: EscrowState::Funded,
        })
    }

    /// `b"release"` followed by the escrow id, little-endian.
    pub fn release_message(&self) -> Vec<u8> {
        let mut msg = b"release".to_vec();
        msg.extend_from_slice(&self.id.to_le_bytes());
        msg
    }

    fn ensure_funded(&self) -> Result<(), SettlementError> {
        if self.state != EscrowState::Funded {
            return Err(SettlementError::NotFunded {
                id: self.id,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Release to the beneficiary if `witness` satisfies the condition at `block`.
    pub fn release(&mut self, witness: &ReleaseWitness, block: BlockHeight) -> Result<(), SettlementError> {
        self.ensure_funded()?;
        match (&self.condition, witness) {
            (EscrowCondition::TimeLock { release_height }, _) => {
                if block < *release_height {
                    return Err(SettlementError::ConditionNotMet(format!(
                        "time lock until block {release_height}"
                    )));
                }
            }
            (EscrowCondition::HashLock { digest }, ReleaseWitness::Preimage(preimage)) => {
                if sha256(preimage) != *digest {
                    return Err(SettlementError::ConditionNotMet("preimage does not match".into()));
                }
            }
            (EscrowCondition::Conditional { arbiter }, ReleaseWitness::ArbiterSignature(sig)) => {
                if !ecdsa_verify(&self.release_message(), sig, arbiter) {
                    return Err(SettlementError::ConditionNotMet("arbiter signature invalid".into()));
                }
            }
            (EscrowCondition::HashLock { .. }, _) => {
                return Err(SettlementError::ConditionNotMet("preimage required".into()));
            }
            (EscrowCondition::Conditional { .. }, _) => {
                return Err(SettlementError::ConditionNotMet("arbiter signature required".into()));
            }
        }
        self.state = EscrowState::Released;
        tracing::info!(escrow_id = self.id, beneficiary = %self.beneficiary, amount = self.amount, "escrow released");
        Ok(())
    }

    /// Return the funds to the depositor. Only from `refund_after` on.
    pub fn refund(&mut self, block: BlockHeight) -> Result<(), SettlementError> {
        self.ensure_funded()?;
        if block < self.refund_after {
            return Err(SettlementError::RefundTooEarly {
                refund_after: self.refund_after,
            });
        }
        self.state = EscrowState::Refunded;
        tracing::info!(escrow_id = self.id, depositor = %self.depositor, amount = self.amount, "escrow refunded");
        Ok(())
    }

    // ── Wire format ─────────────────────────────────────────────────────

    pub fn to_bytes(&self) -> Result<Vec<u8>, SettlementError> {
        let dep_len = check_address(&self.depositor)?;
        let ben_len = check_address(&self.beneficiary)?;
        let mut out = Vec::with_capacity(64 + self.depositor.len() + self.beneficiary.len());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.push(dep_len);
        out.extend_from_slice(self.depositor.as_bytes());
        out.push(ben_len);
        out.extend_from_slice(self.beneficiary.as_bytes());
        out.push(self.asset.tag());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.push(self.condition.tag());
        match &self.condition {
            EscrowCondition::TimeLock { release_height } => out.extend_from_slice(&release_height.to_le_bytes()),
            EscrowCondition::HashLock { digest } => out.extend_from_slice(digest),
            EscrowCondition::Conditional { arbiter } => out.extend_from_slice(arbiter.as_bytes()),
        }
        out.extend_from_slice(&self.refund_after.to_le_bytes());
        out.push(self.state.tag());
        Ok(out)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SettlementError> {
        let mut r = Reader { data, pos: 0 };
        let id = r.u64()?;
        let dep_len = r.u8()?;
        let depositor = Address::from(r.take(usize::from(dep_len))?);
        let ben_len = r.u8()?;
        let beneficiary = Address::from(r.take(usize::from(ben_len))?);
        let asset_tag = r.u8()?;
        let asset = AssetId::from_tag(asset_tag)
            .ok_or_else(|| SettlementError::Malformed(format!("unknown asset tag {asset_tag}")))?;
        let amount = r.u64()?;
        let condition = match r.u8()? {
            TAG_TIME_LOCK => EscrowCondition::TimeLock {
                release_height: r.u64()?,
            },
            TAG_HASH_LOCK => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(r.take(32)?);
                EscrowCondition::HashLock { digest }
            }
            TAG_CONDITIONAL => EscrowCondition::Conditional {
                arbiter: CompressedPubKey::from_slice(r.take(CompressedPubKey::LEN)?)
                    .map_err(|e| SettlementError::Malformed(e.to_string()))?,
            },
            tag => return Err(SettlementError::Malformed(format!("unknown condition tag {tag}"))),
        };
        let refund_after = r.u64()?;
        let state_tag = r.u8()?;
        let state = EscrowState::from_tag(state_tag)
            .ok_or_else(|| SettlementError::Malformed(format!("unknown state tag {state_tag}")))?;
        r.finish()?;

        let mut escrow = Self::new(id, depositor, beneficiary, asset, amount, condition, refund_after)?;
        escrow.state = state;
        Ok(escrow)
    }
}

/// Cursor over a byte slice that fails on truncation.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], SettlementError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len()).ok_or(
            SettlementError::Length {
                expected: self.pos.saturating_add(n),
                got: self.data.len(),
            },
        )?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SettlementError> {
        Ok(self.take(1)?[0])
    }

    fn u64(&mut self) -> Result<u64, SettlementError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn finish(&self) -> Result<(), SettlementError> {
        if self.pos != self.data.len() {
            return Err(SettlementError::Length {
                expected: self.pos,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}

// ── Book ────────────────────────────────────────────────────────────────

/// Escrows keyed by id.
pub struct EscrowBook {
    escrows: BTreeMap<u64, Escrow>,
    next_id: u64,
}

impl EscrowBook {
    pub fn new() -> Self {
        Self {
            escrows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create and store a funded escrow under the next free id.
    pub fn open(
        &mut self,
        depositor: Address,
        beneficiary: Address,
        asset: AssetId,
        amount: u64,
        condition: EscrowCondition,
        refund_after: BlockHeight,
    ) -> Result<u64, SettlementError> {
        let id = self.next_id;
        let escrow = Escrow::new(id, depositor, beneficiary, asset, amount, condition, refund_after)?;
        self.insert(escrow)?;
        Ok(id)
    }

    /// Store an escrow built elsewhere, e.g. decoded from the wire.
    pub fn insert(&mut self, escrow: Escrow) -> Result<(), SettlementError> {
        let id = escrow.id;
        if self.escrows.contains_key(&id) {
            return Err(SettlementError::EscrowExists(id));
        }
        if id >= self.next_id {
            self.next_id = id.checked_add(1).ok_or(SettlementError::IdOverflow)?;
        }
        tracing::debug!(escrow_id = id, asset = %escrow.asset, amount = escrow.amount, "escrow stored");
        self.escrows.insert(id, escrow);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&Escrow> {
        self.escrows.get(&id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Escrow, SettlementError> {
        self.escrows.get_mut(&id).ok_or(SettlementError::EscrowNotFound(id))
    }

    pub fn release(&mut self, id: u64, witness: &ReleaseWitness, block: BlockHeight) -> Result<(), SettlementError> {
        self.get_mut(id)?.release(witness, block)
    }

    pub fn refund(&mut self, id: u64, block: BlockHeight) -> Result<(), SettlementError> {
        self.get_mut(id)?.refund(block)
    }

    pub fn funded(&self) -> impl Iterator<Item = &Escrow> {
        self.escrows.values().filter(|e| e.state == EscrowState::Funded)
    }

    /// Amount of `asset` still locked in funded escrows.
    pub fn total_locked(&self, asset: AssetId) -> u64 {
        self.funded()
            .filter(|e| e.asset == asset)
            .fold(0u64, |acc, e| acc.saturating_add(e.amount))
    }

    pub fn len(&self) -> usize {
        self.escrows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.escrows.is_empty()
    }
}

impl Default for EscrowBook {
    fn default() -> Self {
        Self::new()
    }
}
