//! Local Oracle Contract
//!
//! Stand-in for the external randomness oracle on standalone networks and in
//! tests. Whoever deploys it can push a value with `set_value`; `get_value`
//! answers every feed id with the last value pushed (0 before the first push).
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{contract, contractevent, contractimpl, contracttype, BytesN, Env};

#[contracttype]
pub enum DataKey {
    Value,
}

#[contractevent]
pub struct ValueSet {
    pub value: i128,
}

#[contract]
pub struct OracleTest;

#[contractimpl]
impl OracleTest {
    pub fn set_value(env: Env, value: i128) {
        env.storage().instance().set(&DataKey::Value, &value);
        ValueSet { value }.publish(&env);
    }

    pub fn get_value(env: Env, _id: BytesN<32>) -> i128 {
        env.storage().instance().get(&DataKey::Value).unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{BytesN, Env};

    #[test]
    fn test_defaults_to_zero() {
        let env = Env::default();
        let client = OracleTestClient::new(&env, &env.register(OracleTest, ()));

        assert_eq!(client.get_value(&BytesN::from_array(&env, &[1u8; 32])), 0);
    }

    #[test]
    fn test_last_value_wins_for_any_id() {
        let env = Env::default();
        let client = OracleTestClient::new(&env, &env.register(OracleTest, ()));

        client.set_value(&7);
        client.set_value(&-3);

        assert_eq!(client.get_value(&BytesN::from_array(&env, &[0u8; 32])), -3);
        assert_eq!(client.get_value(&BytesN::from_array(&env, &[9u8; 32])), -3);
    }
}
