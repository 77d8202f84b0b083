//! Winner selection and prize distribution.

use lotto_shared::{set_persistent, RandomnessRecord};
use soroban_sdk::{contractclient, Address, Bytes, BytesN, Env, Vec};

use crate::{
    escrow, get_nft, get_round, load_nft_batch, load_players, load_winners, DataKey, DrawMode,
    Error, RoundState, Winner, WinnerRecord,
};

/// The randomness gateway as seen by the draw: a cached value, no oracle.
#[contractclient(name = "RandomnessClient")]
pub trait RandomnessSource {
    fn read(env: Env) -> RandomnessRecord;
}

/// Map prize slot `slot` onto an index in `[0, player_count)`.
///
/// Deterministic in `(mode, value, slot, player_count)`, so anyone holding
/// the cached randomness value can reproduce a draw. `player_count` must be
/// non-zero.
pub fn winner_index(env: &Env, mode: DrawMode, value: i128, slot: u32, player_count: u32) -> u32 {
    match mode {
        DrawMode::Offset => {
            let count = player_count as i128;
            // rem_euclid keeps negative oracle values in range and avoids
            // overflowing `value + slot` near i128::MAX.
            ((value.rem_euclid(count) + slot as i128) % count) as u32
        }
        DrawMode::Hashed => {
            let mut preimage = [0u8; 20];
            preimage[..16].copy_from_slice(&value.to_be_bytes());
            preimage[16..].copy_from_slice(&slot.to_be_bytes());

            let digest: BytesN<32> = env.crypto().sha256(&Bytes::from_slice(env, &preimage)).into();
            let arr = digest.to_array();
            let raw = u64::from_be_bytes([
                arr[0], arr[1], arr[2], arr[3], arr[4], arr[5], arr[6], arr[7],
            ]);
            (raw % player_count as u64) as u32
        }
    }
}

/// Close the open round: assign and transfer prizes, clear the players and
/// move to `Closed`. Returns the number of prizes handed out.
///
/// The randomness value is read once, and only when there is at least one
/// player/prize pair to assign.
pub(crate) fn run(env: &Env) -> Result<u32, Error> {
    let players = load_players(env);
    let batch = load_nft_batch(env);
    let pairs = players.len().min(batch.len());

    let mut assignments: Vec<(Address, u64)> = Vec::new(env);
    if pairs > 0 {
        let rng_storage: Address = env
            .storage()
            .instance()
            .get(&DataKey::RngStorage)
            .ok_or(Error::NotInitialized)?;
        let record = match RandomnessClient::new(env, &rng_storage).try_read() {
            Ok(Ok(r)) => r,
            _ => return Err(Error::RandomnessUnavailable),
        };
        let mode: DrawMode = env
            .storage()
            .instance()
            .get(&DataKey::DrawMode)
            .unwrap_or(DrawMode::Offset);

        for slot in 0..pairs {
            let index = winner_index(env, mode, record.value, slot, players.len());
            assignments.push_back((players.get_unchecked(index), batch.get_unchecked(slot)));
        }
    }

    // Commit the round before any external transfer.
    let round = get_round(env);
    let timestamp = env.ledger().timestamp();
    if pairs > 0 {
        let mut winners = load_winners(env);
        for (winner, token_id) in assignments.iter() {
            winners.push_back(WinnerRecord {
                round,
                winner,
                token_id,
                timestamp,
            });
        }
        set_persistent(env, &DataKey::Winners, &winners);
        set_persistent(env, &DataKey::NftBatch, &batch.slice(pairs..));
    }
    set_persistent(env, &DataKey::Players, &Vec::<Address>::new(env));
    env.storage()
        .instance()
        .set(&DataKey::State, &RoundState::Closed);

    let nft = get_nft(env);
    for (winner, token_id) in assignments.iter() {
        escrow::send_prize(env, &nft, &winner, token_id)?;
        Winner {
            winner,
            token_id,
            timestamp,
        }
        .publish(env);
    }

    Ok(pairs)
}
