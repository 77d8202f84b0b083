//! Shared helpers for the lottery contracts.
//!
//! Holds the clamped pagination window used by every list accessor, the
//! persistent-storage TTL policy common to all crates and the randomness
//! record exchanged between the gateway and the lottery.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{contracttype, Env, IntoVal, TryFromVal, Val, Vec};

/// Persistent storage TTL in ledgers (~30 days at 5 s/ledger).
/// Bumped on every write so round data never expires mid-round.
pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

/// A cached oracle value and the ledger timestamp at which it was fetched.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RandomnessRecord {
    pub value: i128,
    pub timestamp: u64,
}

/// Return the half-open window `[from, to)` of `items`.
///
/// Out-of-range input is clamped instead of rejected:
/// - `to == 0` or `to > len` reads up to the end,
/// - `from >= len` or `from >= to` yields an empty vector.
///
/// Callers can therefore page through a list of unknown length with a fixed
/// stride, stopping at the first empty page.
pub fn page<T>(items: &Vec<T>, from: u32, to: u32) -> Vec<T>
where
    T: IntoVal<Env, Val> + TryFromVal<Env, Val>,
{
    let len = items.len();
    let to = if to == 0 || to > len { len } else { to };
    if from >= len || from >= to {
        return Vec::new(items.env());
    }
    items.slice(from..to)
}

/// Write `value` under `key` in persistent storage and extend its TTL.
pub fn set_persistent<K, V>(env: &Env, key: &K, value: &V)
where
    K: IntoVal<Env, Val>,
    V: IntoVal<Env, Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}
