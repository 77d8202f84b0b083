//! Prize custody against the NFT collection.

use soroban_sdk::{contractclient, Address, Env, Vec};

use crate::Error;

/// The NFT operations the lottery depends on.
#[contractclient(name = "NftClient")]
pub trait NonFungibleLedger {
    fn owner_of(env: Env, token_id: u64) -> Address;
    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, token_id: u64);
}

/// Move every id in `token_ids` from `from` into the contract and check that
/// the contract ended up owning it.
pub(crate) fn pull_prizes(
    env: &Env,
    nft: &Address,
    from: &Address,
    token_ids: &Vec<u64>,
) -> Result<(), Error> {
    let client = NftClient::new(env, nft);
    let this = env.current_contract_address();

    for token_id in token_ids.iter() {
        match client.try_transfer_from(&this, from, &this, &token_id) {
            Ok(Ok(())) => {}
            _ => return Err(Error::TransferFailed),
        }
        match client.try_owner_of(&token_id) {
            Ok(Ok(owner)) if owner == this => {}
            _ => return Err(Error::TransferFailed),
        }
    }

    Ok(())
}

/// Hand one escrowed token to `winner`.
pub(crate) fn send_prize(
    env: &Env,
    nft: &Address,
    winner: &Address,
    token_id: u64,
) -> Result<(), Error> {
    let this = env.current_contract_address();
    match NftClient::new(env, nft).try_transfer_from(&this, &this, winner, &token_id) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}
