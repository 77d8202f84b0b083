use soroban_sdk::{
    testutils::Address as _,
    token::{StellarAssetClient, TokenClient},
    vec, Address, BytesN, Env,
};

use lotto_lottery::{DrawMode, Lottery, LotteryClient, RoundState};
use lotto_nft::{NftContract, NftContractClient};
use lotto_oracle_test::{OracleTest, OracleTestClient};
use lotto_rng_oracle_storage::{RngOracleStorage, RngOracleStorageClient};

const FEE: i128 = 1_000;

/// Two rounds back to back: a manually closed one and one closed by the
/// player cap, followed by a fee withdrawal.
#[test]
fn test_two_rounds_then_withdraw() {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let treasury = Address::generate(&env);

    let token_contract = env.register_stellar_asset_contract_v2(token_admin);
    let token_sac = StellarAssetClient::new(&env, &token_contract.address());
    let token = TokenClient::new(&env, &token_contract.address());

    let oracle = OracleTestClient::new(&env, &env.register(OracleTest, ()));
    let rng = RngOracleStorageClient::new(&env, &env.register(RngOracleStorage, ()));
    let nft = NftContractClient::new(&env, &env.register(NftContract, ()));
    let lottery = LotteryClient::new(&env, &env.register(Lottery, ()));

    rng.init(&admin, &oracle.address, &BytesN::from_array(&env, &[1u8; 32]));
    nft.init(&admin);
    lottery.init(
        &admin,
        &token.address,
        &FEE,
        &nft.address,
        &rng.address,
        &DrawMode::Offset,
    );

    for _ in 0..10 {
        nft.mint(&admin, &admin);
    }
    nft.set_approval_for_all(&admin, &lottery.address, &true);

    let accounts: [Address; 5] = core::array::from_fn(|_| {
        let a = Address::generate(&env);
        token_sac.mint(&a, &(FEE * 5));
        a
    });

    // Round 1: two players, two prizes, closed by the operator.
    lottery.add_to_nft_batch(&admin, &vec![&env, 1u64, 2u64]);
    lottery.start(&admin, &Some(5));
    lottery.enter(&accounts[0], &FEE);
    lottery.enter(&accounts[1], &FEE);
    assert_eq!(token.balance(&lottery.address), 2 * FEE);

    oracle.set_value(&3);
    rng.fetch();
    assert_eq!(lottery.close(&admin), 2);

    // 3 mod 2 == 1, then wraps to 0.
    assert_eq!(nft.owner_of(&1), accounts[1]);
    assert_eq!(nft.owner_of(&2), accounts[0]);
    assert_eq!(lottery.state(), RoundState::Closed);

    // Round 2: the fifth entry fills the cap and triggers the draw.
    lottery.add_to_nft_batch(&admin, &vec![&env, 3u64]);
    lottery.start(&admin, &Some(5));
    for account in accounts.iter().take(4) {
        lottery.enter(account, &FEE);
    }
    let batch_before = lottery.get_nft_batch_length();
    lottery.enter(&accounts[4], &FEE);

    assert_eq!(lottery.state(), RoundState::Closed);
    assert_eq!(lottery.get_players_length(), 0);
    assert_eq!(lottery.get_nft_batch_length(), batch_before - 1);
    assert_eq!(nft.owner_of(&3), accounts[3]);
    assert_eq!(lottery.get_winners_length(), 3);
    assert_eq!(lottery.round(), 2);

    // Fees from both rounds go out in one withdrawal.
    assert_eq!(lottery.withdraw(&admin, &treasury), 7 * FEE);
    assert_eq!(token.balance(&treasury), 7 * FEE);
    assert_eq!(token.balance(&lottery.address), 0);
}
