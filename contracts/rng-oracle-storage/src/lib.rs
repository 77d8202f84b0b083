//! Lottery RNG Oracle Storage Contract
//!
//! Pull-based cache in front of an external randomness oracle:
//!
//! 1. Anyone calls `fetch`, which queries `oracle.get_value(oracle_id)` and
//!    overwrites the cached record with the returned value and the ledger
//!    timestamp of the fetch.
//! 2. Consumers (the lottery draw) call `read` and get the cached record
//!    without touching the oracle.
//!
//! A failed `fetch` leaves the previous record in place, so it can simply be
//! called again; the last successful value wins.
//!
//! ## Storage Strategy
//! - `instance()`: Admin, Oracle, OracleId. Fixed contract-level config.
//! - `persistent()`: Latest record, TTL bumped on every fetch.
#![no_std]
#![allow(unexpected_cfgs)]

pub use lotto_shared::RandomnessRecord;
use lotto_shared::set_persistent;
use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, Address,
    BytesN, Env,
};

// ---------------------------------------------------------------------------
// Oracle interface
// ---------------------------------------------------------------------------

/// The only oracle operation this contract depends on.
#[contractclient(name = "OracleClient")]
pub trait Oracle {
    fn get_value(env: Env, id: BytesN<32>) -> i128;
}

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized    = 1,
    NotInitialized        = 2,
    Unauthorized          = 3,
    /// The oracle call failed or returned something that is not an `i128`.
    OracleUnreachable     = 4,
    /// `read` before any successful `fetch`.
    RandomnessUnavailable = 5,
}

// ---------------------------------------------------------------------------
// Storage Types
// ---------------------------------------------------------------------------

#[contracttype]
pub enum DataKey {
    // --- instance() ---
    Admin,
    Oracle,
    OracleId,
    // --- persistent() ---
    /// Most recent successfully fetched value.
    Latest,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct RandomnessFetched {
    #[topic]
    pub oracle: Address,
    pub value: i128,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct RngOracleStorage;

#[contractimpl]
impl RngOracleStorage {
    /// Initialize the cache. May only be called once.
    ///
    /// `oracle` is the contract queried by `fetch`; `oracle_id` is the feed
    /// identifier passed through to it unchanged.
    pub fn init(
        env: Env,
        admin: Address,
        oracle: Address,
        oracle_id: BytesN<32>,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        env.storage().instance().set(&DataKey::OracleId, &oracle_id);

        Ok(())
    }

    /// Query the oracle and replace the cached record.
    ///
    /// Any failure of the oracle call maps to `OracleUnreachable`; the cache
    /// is only written after a value has been obtained.
    pub fn fetch(env: Env) -> Result<RandomnessRecord, Error> {
        require_initialized(&env)?;

        let oracle: Address = env
            .storage()
            .instance()
            .get(&DataKey::Oracle)
            .ok_or(Error::NotInitialized)?;
        let oracle_id: BytesN<32> = env
            .storage()
            .instance()
            .get(&DataKey::OracleId)
            .ok_or(Error::NotInitialized)?;

        let value = match OracleClient::new(&env, &oracle).try_get_value(&oracle_id) {
            Ok(Ok(v)) => v,
            _ => return Err(Error::OracleUnreachable),
        };

        let record = RandomnessRecord {
            value,
            timestamp: env.ledger().timestamp(),
        };
        set_persistent(&env, &DataKey::Latest, &record);

        RandomnessFetched {
            oracle,
            value,
            timestamp: record.timestamp,
        }
        .publish(&env);

        Ok(record)
    }

    /// Return the cached record, or `RandomnessUnavailable` if `fetch` has
    /// never succeeded.
    pub fn read(env: Env) -> Result<RandomnessRecord, Error> {
        require_initialized(&env)?;

        env.storage()
            .persistent()
            .get(&DataKey::Latest)
            .ok_or(Error::RandomnessUnavailable)
    }

    pub fn oracle(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Oracle)
            .ok_or(Error::NotInitialized)
    }

    pub fn oracle_id(env: Env) -> Result<BytesN<32>, Error> {
        env.storage()
            .instance()
            .get(&DataKey::OracleId)
            .ok_or(Error::NotInitialized)
    }

    /// Point the cache at a different oracle. Admin only.
    ///
    /// The cached record is kept; the next `fetch` reads from the new oracle.
    pub fn set_oracle(
        env: Env,
        admin: Address,
        oracle: Address,
        oracle_id: BytesN<32>,
    ) -> Result<(), Error> {
        require_admin(&env, &admin)?;

        env.storage().instance().set(&DataKey::Oracle, &oracle);
        env.storage().instance().set(&DataKey::OracleId, &oracle_id);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_initialized(env: &Env) -> Result<(), Error> {
    if !env.storage().instance().has(&DataKey::Admin) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)?;
    caller.require_auth();
    if caller != &admin {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
