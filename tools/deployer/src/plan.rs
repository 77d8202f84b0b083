//! The lottery's deployment order.
//!
//! Address book inputs read here: `Admin`, `FeeToken`, `EntryFee`,
//! `OracleId`, `Oracle` (non-local networks only) and the optional
//! `DrawMode` (`0` offset, `1` hashed; defaults to `0`).

use tracing::info;

use crate::error::Result;
use crate::network::Network;
use crate::resolver::{ContractHandle, Deployer, InitArg, Resolver};

pub const ORACLE_TEST: &str = "OracleTest";
pub const RNG_ORACLE_STORAGE: &str = "RngOracleStorage";
pub const NFT_CONTRACT: &str = "NFTContract";
pub const LOTTERY: &str = "Lottery";

/// Wasm artifact stem for a contract source name.
pub fn wasm_stem(source: &str) -> Option<&'static str> {
    match source {
        ORACLE_TEST => Some("lotto_oracle_test"),
        RNG_ORACLE_STORAGE => Some("lotto_rng_oracle_storage"),
        NFT_CONTRACT => Some("lotto_nft"),
        LOTTERY => Some("lotto_lottery"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub admin: String,
    pub oracle: String,
    pub rng_storage: ContractHandle,
    pub nft: ContractHandle,
    pub lottery: ContractHandle,
}

/// Resolve every contract in dependency order. Re-running against the same
/// address book deploys nothing new.
pub fn deploy_all<D: Deployer>(
    resolver: &mut Resolver<D>,
    network: &Network,
) -> Result<Deployment> {
    let admin = resolver.book().require("Admin")?.to_owned();
    let oracle_id = resolver.book().require("OracleId")?.to_owned();
    let fee_token = resolver.book().require("FeeToken")?.to_owned();
    let entry_fee = resolver.book().require("EntryFee")?.to_owned();
    let draw_mode = resolver.book().get("DrawMode").unwrap_or("0").to_owned();

    let oracle = if network.is_local() {
        resolver.resolve(ORACLE_TEST, &[])?.address
    } else {
        resolver.book().require("Oracle")?.to_owned()
    };

    let rng_storage = resolver.resolve(
        RNG_ORACLE_STORAGE,
        &[
            InitArg::new("admin", &admin),
            InitArg::new("oracle", &oracle),
            InitArg::new("oracle_id", &oracle_id),
        ],
    )?;

    let nft = resolver.resolve(NFT_CONTRACT, &[InitArg::new("admin", &admin)])?;

    let lottery = resolver.resolve(
        LOTTERY,
        &[
            InitArg::new("admin", &admin),
            InitArg::new("fee_token", fee_token),
            InitArg::new("entry_fee", entry_fee),
            InitArg::new("nft", &nft.address),
            InitArg::new("rng_storage", &rng_storage.address),
            InitArg::new("draw_mode", draw_mode),
        ],
    )?;

    info!("lottery ready at {} on {}", lottery.address, network);

    Ok(Deployment {
        admin,
        oracle,
        rng_storage,
        nft,
        lottery,
    })
}

/// Prime a test network: cache a randomness value, mint `prizes` NFTs to the
/// admin and approve the lottery to escrow them.
pub fn seed_test_network<D: Deployer>(
    resolver: &mut Resolver<D>,
    deployment: &Deployment,
    prizes: u32,
) -> Result<()> {
    resolver.invoke(&deployment.rng_storage.address, "fetch", &[])?;

    for _ in 0..prizes {
        resolver.invoke(
            &deployment.nft.address,
            "mint",
            &[
                InitArg::new("admin", &deployment.admin),
                InitArg::new("to", &deployment.admin),
            ],
        )?;
    }

    resolver.invoke(
        &deployment.nft.address,
        "set_approval_for_all",
        &[
            InitArg::new("owner", &deployment.admin),
            InitArg::new("operator", &deployment.lottery.address),
            InitArg::new("approved", "true"),
        ],
    )?;

    info!("minted {} prizes to {}", prizes, deployment.admin);
    Ok(())
}
