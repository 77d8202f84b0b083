//! Lottery Contract
//!
//! Players pay a fixed entry fee in a SEP-41 token for a slot in the current
//! round. The operator escrows a batch of NFTs as prizes. Closing the round
//! draws winners with the value cached by the RNG oracle storage contract and
//! sends one escrowed NFT per winning slot.
//!
//! ## Round Lifecycle
//! ```text
//!   Idle ──start──▶ Open ──close / cap reached──▶ Closed ──start──▶ Open ...
//!                   │  ▲
//!                   └──┘ enter
//! ```
//!
//! ## Draw
//! `n = min(players, prizes)` pairs are consumed. Slot `i` receives
//! `batch[i]` and goes to `players[winner_index(i)]`, where the index is
//! derived from the cached randomness value according to the configured
//! [`DrawMode`]. Unconsumed prizes stay in the batch for the next round; the
//! player list is always cleared.
//!
//! Every entrypoint is all-or-nothing: returning an error rolls back every
//! storage write and sub-call of the invocation, so a failed prize transfer
//! leaves the round exactly as it was before `close`.
//!
//! ## Storage Strategy
//! - `instance()`: Admin, FeeToken, EntryFee, Nft, RngStorage, DrawMode,
//!   State, Round, MaxPlayers.
//! - `persistent()`: Players, NftBatch, Winners, Fees. TTL bumped on write.
#![no_std]
#![allow(unexpected_cfgs)]

mod draw;
mod escrow;

pub use draw::{winner_index, RandomnessClient, RandomnessSource};
pub use escrow::{NftClient, NonFungibleLedger};

use lotto_shared::{page, set_persistent};
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, token::TokenClient,
    Address, Env, Vec,
};

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
    /// Operation not allowed in the current round state.
    InvalidState          = 4,
    /// `payment` differs from the configured entry fee.
    InsufficientFee       = 5,
    /// The RNG storage contract has no cached value yet.
    RandomnessUnavailable = 6,
    /// A fee-token or NFT transfer failed.
    TransferFailed        = 7,
    InvalidAmount         = 8,
    InvalidInput          = 9,
    Overflow              = 10,
}

// ---------------------------------------------------------------------------
// Storage Types
// ---------------------------------------------------------------------------

#[contracttype]
pub enum DataKey {
    // --- instance() ---
    Admin,
    FeeToken,
    EntryFee,
    Nft,
    RngStorage,
    DrawMode,
    State,
    Round,
    /// Absent when the round has no cap.
    MaxPlayers,
    // --- persistent() ---
    /// Entrants of the open round, in entry order.
    Players,
    /// Escrowed prize token ids, in contribution order.
    NftBatch,
    /// Every prize handed out so far, oldest first.
    Winners,
    Fees,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RoundState {
    Idle   = 0,
    Open   = 1,
    Closed = 2,
}

/// How a prize slot is mapped onto a player index.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum DrawMode {
    /// `(value + slot) mod players`: consecutive slots go to consecutive players.
    Offset = 0,
    /// `sha256(value_be || slot_be)[0..8] mod players`: slots are independent.
    Hashed = 1,
}

/// Fee custody accounting.
///
/// `total_paid - total_withdrawn == collected` after every invocation.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FeeLedger {
    pub collected: i128,
    pub total_paid: i128,
    pub total_withdrawn: i128,
}

/// One prize handed out by a draw.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WinnerRecord {
    pub round: u32,
    pub winner: Address,
    pub token_id: u64,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct RoundStarted {
    #[topic]
    pub round: u32,
    pub max_players: Option<u32>,
}

#[contractevent]
pub struct PlayerEntered {
    #[topic]
    pub round: u32,
    #[topic]
    pub player: Address,
    pub slot: u32,
}

/// Published once per prize transfer of a draw.
#[contractevent]
pub struct Winner {
    #[topic]
    pub winner: Address,
    pub token_id: u64,
    pub timestamp: u64,
}

/// Published by `enter` when the player cap closed the round.
#[contractevent]
pub struct LotteryFulfilled {
    #[topic]
    pub round: u32,
    pub players: u32,
    pub prizes: u32,
}

#[contractevent]
pub struct PrizesAdded {
    pub count: u32,
    pub batch_length: u32,
}

#[contractevent]
pub struct FeesWithdrawn {
    #[topic]
    pub to: Address,
    pub amount: i128,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct Lottery;

#[contractimpl]
impl Lottery {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Initialize the lottery. May only be called once.
    ///
    /// `fee_token` is the SEP-41 token entry fees are paid in, `nft` the
    /// prize collection and `rng_storage` the RNG oracle storage contract
    /// read at draw time. `entry_fee` is fixed for the contract's lifetime.
    pub fn init(
        env: Env,
        admin: Address,
        fee_token: Address,
        entry_fee: i128,
        nft: Address,
        rng_storage: Address,
        draw_mode: DrawMode,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        if entry_fee <= 0 {
            return Err(Error::InvalidAmount);
        }

        let instance = env.storage().instance();
        instance.set(&DataKey::Admin, &admin);
        instance.set(&DataKey::FeeToken, &fee_token);
        instance.set(&DataKey::EntryFee, &entry_fee);
        instance.set(&DataKey::Nft, &nft);
        instance.set(&DataKey::RngStorage, &rng_storage);
        instance.set(&DataKey::DrawMode, &draw_mode);
        instance.set(&DataKey::State, &RoundState::Idle);
        instance.set(&DataKey::Round, &0u32);

        set_persistent(&env, &DataKey::Players, &Vec::<Address>::new(&env));
        set_persistent(&env, &DataKey::NftBatch, &Vec::<u64>::new(&env));
        set_persistent(&env, &DataKey::Winners, &Vec::<WinnerRecord>::new(&env));
        set_persistent(&env, &DataKey::Fees, &FeeLedger::default());

        Ok(())
    }

    // -----------------------------------------------------------------------
    // add_to_nft_batch
    // -----------------------------------------------------------------------

    /// Escrow `token_ids` as prizes. Admin only.
    ///
    /// Each token is pulled from the admin with `transfer_from`, so the admin
    /// must have approved this contract on the NFT collection beforehand.
    /// Ids are appended in the given order. If any transfer fails nothing is
    /// appended and every earlier transfer of the call is undone.
    pub fn add_to_nft_batch(env: Env, admin: Address, token_ids: Vec<u64>) -> Result<(), Error> {
        require_initialized(&env)?;
        require_admin(&env, &admin)?;

        if token_ids.is_empty() {
            return Err(Error::InvalidInput);
        }

        escrow::pull_prizes(&env, &get_nft(&env), &admin, &token_ids)?;

        let mut batch = load_nft_batch(&env);
        batch.append(&token_ids);
        set_persistent(&env, &DataKey::NftBatch, &batch);

        PrizesAdded {
            count: token_ids.len(),
            batch_length: batch.len(),
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    /// Open a new round. Admin only.
    ///
    /// `max_players` caps the round: the entry that fills the last slot
    /// closes it and runs the draw. `None` leaves the round open until
    /// `close`.
    pub fn start(env: Env, admin: Address, max_players: Option<u32>) -> Result<(), Error> {
        require_initialized(&env)?;
        require_admin(&env, &admin)?;

        if get_state(&env) == RoundState::Open {
            return Err(Error::InvalidState);
        }
        if max_players == Some(0) {
            return Err(Error::InvalidInput);
        }

        let round = get_round(&env).checked_add(1).ok_or(Error::Overflow)?;

        let instance = env.storage().instance();
        instance.set(&DataKey::Round, &round);
        instance.set(&DataKey::State, &RoundState::Open);
        match max_players {
            Some(cap) => instance.set(&DataKey::MaxPlayers, &cap),
            None => instance.remove(&DataKey::MaxPlayers),
        }

        RoundStarted { round, max_players }.publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // enter
    // -----------------------------------------------------------------------

    /// Buy one slot in the open round.
    ///
    /// `payment` must equal the entry fee exactly; it is transferred from
    /// `player` into the contract. The same address may enter several times
    /// and gets one slot per entry. When the entry fills the player cap the
    /// round is closed and drawn within this call, and `LotteryFulfilled`
    /// is published.
    pub fn enter(env: Env, player: Address, payment: i128) -> Result<(), Error> {
        require_initialized(&env)?;
        player.require_auth();

        if get_state(&env) != RoundState::Open {
            return Err(Error::InvalidState);
        }
        if payment != get_entry_fee(&env)? {
            return Err(Error::InsufficientFee);
        }

        let mut fees = get_fees(&env);
        fees.collected = fees.collected.checked_add(payment).ok_or(Error::Overflow)?;
        fees.total_paid = fees.total_paid.checked_add(payment).ok_or(Error::Overflow)?;
        set_persistent(&env, &DataKey::Fees, &fees);

        let mut players = load_players(&env);
        let slot = players.len();
        players.push_back(player.clone());
        set_persistent(&env, &DataKey::Players, &players);

        let token = get_fee_token(&env);
        let this = env.current_contract_address();
        match TokenClient::new(&env, &token).try_transfer(&player, &this, &payment) {
            Ok(Ok(())) => {}
            _ => return Err(Error::TransferFailed),
        }

        let round = get_round(&env);
        PlayerEntered {
            round,
            player,
            slot,
        }
        .publish(&env);

        let cap: Option<u32> = env.storage().instance().get(&DataKey::MaxPlayers);
        if let Some(cap) = cap {
            if players.len() >= cap {
                let prizes = draw::run(&env)?;
                LotteryFulfilled {
                    round,
                    players: players.len(),
                    prizes,
                }
                .publish(&env);
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // close
    // -----------------------------------------------------------------------

    /// Close the open round and run the draw. Admin only.
    ///
    /// Returns the number of prizes handed out. A round without players or
    /// without prizes closes without reading randomness or publishing events.
    pub fn close(env: Env, admin: Address) -> Result<u32, Error> {
        require_initialized(&env)?;
        require_admin(&env, &admin)?;

        if get_state(&env) != RoundState::Open {
            return Err(Error::InvalidState);
        }

        draw::run(&env)
    }

    // -----------------------------------------------------------------------
    // withdraw
    // -----------------------------------------------------------------------

    /// Send every collected entry fee to `to`. Admin only.
    ///
    /// Returns the amount sent. With nothing collected no transfer happens.
    pub fn withdraw(env: Env, admin: Address, to: Address) -> Result<i128, Error> {
        require_initialized(&env)?;
        require_admin(&env, &admin)?;

        let mut fees = get_fees(&env);
        let amount = fees.collected;
        if amount == 0 {
            return Ok(0);
        }

        // Update accounting before the external token transfer.
        fees.collected = 0;
        fees.total_withdrawn = fees
            .total_withdrawn
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        set_persistent(&env, &DataKey::Fees, &fees);

        let token = get_fee_token(&env);
        let this = env.current_contract_address();
        match TokenClient::new(&env, &token).try_transfer(&this, &to, &amount) {
            Ok(Ok(())) => {}
            _ => return Err(Error::TransferFailed),
        }

        FeesWithdrawn { to, amount }.publish(&env);

        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Paginated readers
    // -----------------------------------------------------------------------

    /// Entrants of the open round in `[from, to)`, clamped to the list.
    pub fn get_players(env: Env, from: u32, to: u32) -> Vec<Address> {
        page(&load_players(&env), from, to)
    }

    pub fn get_players_length(env: Env) -> u32 {
        load_players(&env).len()
    }

    /// Escrowed prize ids in `[from, to)`, clamped to the batch.
    pub fn get_nft_batch(env: Env, from: u32, to: u32) -> Vec<u64> {
        page(&load_nft_batch(&env), from, to)
    }

    pub fn get_nft_batch_length(env: Env) -> u32 {
        load_nft_batch(&env).len()
    }

    /// Past prize transfers in `[from, to)`, oldest first.
    pub fn get_winners(env: Env, from: u32, to: u32) -> Vec<WinnerRecord> {
        page(&load_winners(&env), from, to)
    }

    pub fn get_winners_length(env: Env) -> u32 {
        load_winners(&env).len()
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn state(env: Env) -> Result<RoundState, Error> {
        require_initialized(&env)?;
        Ok(get_state(&env))
    }

    pub fn round(env: Env) -> Result<u32, Error> {
        require_initialized(&env)?;
        Ok(get_round(&env))
    }

    pub fn entry_fee(env: Env) -> Result<i128, Error> {
        get_entry_fee(&env)
    }

    pub fn max_players(env: Env) -> Option<u32> {
        env.storage().instance().get(&DataKey::MaxPlayers)
    }

    pub fn fee_ledger(env: Env) -> Result<FeeLedger, Error> {
        require_initialized(&env)?;
        Ok(get_fees(&env))
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

/// Verify that `caller` is the stored admin and has signed the invocation.
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

fn get_entry_fee(env: &Env) -> Result<i128, Error> {
    env.storage()
        .instance()
        .get(&DataKey::EntryFee)
        .ok_or(Error::NotInitialized)
}

fn get_fee_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::FeeToken)
        .expect("Lottery: fee token not set")
}

pub(crate) fn get_nft(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Nft)
        .expect("Lottery: nft not set")
}

fn get_state(env: &Env) -> RoundState {
    env.storage()
        .instance()
        .get(&DataKey::State)
        .unwrap_or(RoundState::Idle)
}

pub(crate) fn get_round(env: &Env) -> u32 {
    env.storage().instance().get(&DataKey::Round).unwrap_or(0)
}

fn get_fees(env: &Env) -> FeeLedger {
    env.storage()
        .persistent()
        .get(&DataKey::Fees)
        .unwrap_or_default()
}

pub(crate) fn load_players(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::Players)
        .unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn load_nft_batch(env: &Env) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::NftBatch)
        .unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn load_winners(env: &Env) -> Vec<WinnerRecord> {
    env.storage()
        .persistent()
        .get(&DataKey::Winners)
        .unwrap_or_else(|| Vec::new(env))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
