//! Byte-exact wire formats: the signed ballot payload and the
//! per-type `execution_data` layouts.

use crate::error::GovernanceError;
use crate::proposal::VoteChoice;
use polis_types::Address;

/// `[pid u64 LE][voter 32][choice u8][claimed_power u64 LE]`
pub const VOTE_PAYLOAD_LEN: usize = 49;

/// Canonical ballot payload signed by the voter.
pub fn vote_payload(
    proposal_id: u64,
    voter: &[u8; 32],
    choice: VoteChoice,
    claimed_power: u64,
) -> [u8; VOTE_PAYLOAD_LEN] {
    let mut out = [0u8; VOTE_PAYLOAD_LEN];
    out[0..8].copy_from_slice(&proposal_id.to_le_bytes());
    out[8..40].copy_from_slice(voter);
    out[40] = choice.tag();
    out[41..49].copy_from_slice(&claimed_power.to_le_bytes());
    out
}

fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_le_bytes(arr))
}

/// PARAMETER_CHANGE data: `[key_len u8][key bytes][value u64 LE]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterChange {
    pub key: String,
    pub value: u64,
}

impl ParameterChange {
    pub fn new(key: impl Into<String>, value: u64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        let key = self.key.as_bytes();
        let key_len = u8::try_from(key.len()).map_err(|_| {
            GovernanceError::MalformedExecutionData(format!("key longer than 255 bytes: {}", key.len()))
        })?;
        let mut out = Vec::with_capacity(1 + key.len() + 8);
        out.push(key_len);
        out.extend_from_slice(key);
        out.extend_from_slice(&self.value.to_le_bytes());
        Ok(out)
    }

    /// Exact-length decode; truncated or trailing bytes are rejected.
    pub fn decode(data: &[u8]) -> Result<Self, GovernanceError> {
        let malformed = |why: &str| GovernanceError::MalformedExecutionData(why.to_string());
        let (&key_len, rest) = data.split_first().ok_or_else(|| malformed("empty"))?;
        let key_len = usize::from(key_len);
        if rest.len() != key_len + 8 {
            return Err(malformed("parameter change length mismatch"));
        }
        let (key, value) = rest.split_at(key_len);
        let key = std::str::from_utf8(key).map_err(|_| malformed("key is not UTF-8"))?;
        if key.is_empty() {
            return Err(malformed("empty key"));
        }
        let value = read_u64_le(value).ok_or_else(|| malformed("value"))?;
        Ok(Self::new(key, value))
    }
}

/// TREASURY_SPENDING data: `[amount u64 LE][addr_len u8][addr bytes]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasurySpend {
    pub amount: u64,
    pub recipient: Address,
}

impl TreasurySpend {
    pub fn new(amount: u64, recipient: Address) -> Self {
        Self { amount, recipient }
    }

    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        let addr = self.recipient.as_bytes();
        let addr_len = u8::try_from(addr.len()).map_err(|_| {
            GovernanceError::MalformedExecutionData(format!("recipient longer than 255 bytes: {}", addr.len()))
        })?;
        let mut out = Vec::with_capacity(8 + 1 + addr.len());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.push(addr_len);
        out.extend_from_slice(addr);
        Ok(out)
    }

    pub fn decode(data: &[u8]) -> Result<Self, GovernanceError> {
        let malformed = |why: &str| GovernanceError::MalformedExecutionData(why.to_string());
        if data.len() < 9 {
            return Err(malformed("treasury spend truncated"));
        }
        let amount = read_u64_le(&data[..8]).ok_or_else(|| malformed("amount"))?;
        let addr_len = usize::from(data[8]);
        let addr = &data[9..];
        if addr.len() != addr_len {
            return Err(malformed("recipient length mismatch"));
        }
        if addr.is_empty() {
            return Err(malformed("empty recipient"));
        }
        Ok(Self::new(amount, Address::from(addr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_payload_layout() {
        let voter = [0xABu8; 32];
        let p = vote_payload(0x0102, &voter, VoteChoice::Abstain, 5000);
        assert_eq!(p.len(), 49);
        assert_eq!(&p[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&p[8..40], &voter);
        assert_eq!(p[40], 2);
        assert_eq!(&p[41..49], &5000u64.to_le_bytes());
    }

    #[test]
    fn parameter_change_layout() {
        let bytes = ParameterChange::new("voting_period", 42).encode().unwrap();
        assert_eq!(bytes[0], 13);
        assert_eq!(&bytes[1..14], b"voting_period");
        assert_eq!(&bytes[14..], &42u64.to_le_bytes());
        assert_eq!(ParameterChange::decode(&bytes).unwrap(), ParameterChange::new("voting_period", 42));
    }

    #[test]
    fn parameter_change_rejects_truncation() {
        let bytes = ParameterChange::new("k", 1).encode().unwrap();
        assert!(ParameterChange::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(ParameterChange::decode(&[]).is_err());
        let mut long = bytes.clone();
        long.push(0);
        assert!(ParameterChange::decode(&long).is_err());
        assert!(ParameterChange::new("x".repeat(256), 1).encode().is_err());
    }

    #[test]
    fn treasury_spend_layout() {
        let recipient = Address::from([9u8; 32]);
        let bytes = TreasurySpend::new(1_000, recipient.clone()).encode().unwrap();
        assert_eq!(&bytes[..8], &1_000u64.to_le_bytes());
        assert_eq!(bytes[8], 32);
        assert_eq!(TreasurySpend::decode(&bytes).unwrap().recipient, recipient);
        assert!(TreasurySpend::decode(&bytes[..20]).is_err());
        assert!(TreasurySpend::decode(&bytes[..8]).is_err());
    }
}
