//! Lottery NFT Contract
//!
//! Minimal non-fungible ownership ledger used as the prize collection on
//! local networks and in tests. Tokens carry no metadata: a token is an id
//! and an owner.
//!
//! - `mint` hands out sequential ids starting at 1.
//! - `transfer_from` moves a token when the spender is its owner or an
//!   operator the owner approved with `set_approval_for_all`.
//!
//! ## Storage Strategy
//! - `instance()`: Admin, NextId.
//! - `persistent()`: Owner(id), Balance(owner), Operator(owner, operator).
#![no_std]
#![allow(unexpected_cfgs)]

use lotto_shared::set_persistent;
use soroban_sdk::{contract, contracterror, contractevent, contractimpl, contracttype, Address, Env};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized     = 2,
    NotAuthorized      = 3,
    TokenNotFound      = 4,
    /// `from` does not own the token.
    NotOwner           = 5,
    /// Spender is neither the owner nor an approved operator.
    NotApproved        = 6,
    Overflow           = 7,
}

#[contracttype]
pub enum DataKey {
    // --- instance() ---
    Admin,
    NextId,
    // --- persistent() ---
    Owner(u64),
    Balance(Address),
    Operator(Address, Address),
}

#[contractevent]
pub struct Minted {
    #[topic]
    pub to: Address,
    pub token_id: u64,
}

#[contractevent]
pub struct Transferred {
    #[topic]
    pub from: Address,
    #[topic]
    pub to: Address,
    pub token_id: u64,
}

#[contractevent]
pub struct ApprovalForAll {
    #[topic]
    pub owner: Address,
    #[topic]
    pub operator: Address,
    pub approved: bool,
}

#[contract]
pub struct NftContract;

#[contractimpl]
impl NftContract {
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::NextId, &1u64);

        Ok(())
    }

    /// Mint the next token id to `to`. Admin only.
    pub fn mint(env: Env, admin: Address, to: Address) -> Result<u64, Error> {
        require_admin(&env, &admin)?;

        let token_id: u64 = env.storage().instance().get(&DataKey::NextId).unwrap_or(1);
        let next = token_id.checked_add(1).ok_or(Error::Overflow)?;
        env.storage().instance().set(&DataKey::NextId, &next);

        set_persistent(&env, &DataKey::Owner(token_id), &to);
        adjust_balance(&env, &to, 1)?;

        Minted { to, token_id }.publish(&env);

        Ok(token_id)
    }

    pub fn owner_of(env: Env, token_id: u64) -> Result<Address, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Owner(token_id))
            .ok_or(Error::TokenNotFound)
    }

    pub fn balance_of(env: Env, owner: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(owner))
            .unwrap_or(0)
    }

    /// Allow or revoke `operator` moving every token of `owner`.
    pub fn set_approval_for_all(env: Env, owner: Address, operator: Address, approved: bool) {
        owner.require_auth();

        let key = DataKey::Operator(owner.clone(), operator.clone());
        if approved {
            set_persistent(&env, &key, &true);
        } else {
            env.storage().persistent().remove(&key);
        }

        ApprovalForAll { owner, operator, approved }.publish(&env);
    }

    pub fn is_approved_for_all(env: Env, owner: Address, operator: Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Operator(owner, operator))
    }

    /// Move `token_id` from `from` to `to`, signed by `spender`.
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<(), Error> {
        spender.require_auth();

        let owner: Address = env
            .storage()
            .persistent()
            .get(&DataKey::Owner(token_id))
            .ok_or(Error::TokenNotFound)?;
        if owner != from {
            return Err(Error::NotOwner);
        }
        if spender != from
            && !env
                .storage()
                .persistent()
                .has(&DataKey::Operator(from.clone(), spender.clone()))
        {
            return Err(Error::NotApproved);
        }

        set_persistent(&env, &DataKey::Owner(token_id), &to);
        adjust_balance(&env, &from, -1)?;
        adjust_balance(&env, &to, 1)?;

        Transferred { from, to, token_id }.publish(&env);

        Ok(())
    }
}

fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)?;
    caller.require_auth();
    if caller != &admin {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn adjust_balance(env: &Env, owner: &Address, delta: i64) -> Result<(), Error> {
    let key = DataKey::Balance(owner.clone());
    let current: u64 = env.storage().persistent().get(&key).unwrap_or(0);
    let updated = current.checked_add_signed(delta).ok_or(Error::Overflow)?;
    set_persistent(env, &key, &updated);
    Ok(())
}
