use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use lotto_deployer::{
    deploy_all, seed_test_network, AddressBook, Error, Network, PassphraseSource, Resolver,
    RpcProbe, StellarCli,
};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "lotto-deploy", version, about = "Deploy the lottery contracts once per network")]
struct Args {
    /// Refuse to deploy unless the endpoint reports this passphrase
    #[arg(long)]
    expect_passphrase: Option<String>,

    /// Network alias passed to the stellar CLI; its RPC decides the address book
    #[arg(short, long, default_value = "local")]
    network: String,

    /// Signing identity passed to the stellar CLI
    #[arg(short, long)]
    source: String,

    /// Directory holding config-<network>.json
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[arg(long, default_value = "target/wasm32v1-none/release")]
    wasm_dir: PathBuf,

    #[arg(long, default_value = "stellar")]
    stellar_bin: PathBuf,

    /// Readiness attempts before giving up
    #[arg(long, default_value_t = 6)]
    retries: u32,

    /// On local and test networks, mint this many prize NFTs to the admin
    #[arg(long, default_value_t = 0)]
    seed_prizes: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lotto_deployer=info".parse().unwrap())
                .add_directive("lotto_deploy=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let cli = StellarCli {
        binary: args.stellar_bin,
        wasm_dir: args.wasm_dir,
        network: args.network,
        source: args.source,
    };

    let probe = RpcProbe::new(cli.clone(), args.expect_passphrase);
    let network = wait_for_network(&probe, args.retries)?;
    info!("alias {} serves network {}", cli.network, network);

    let book = AddressBook::load(&args.config_dir, &network)?;
    info!("address book {}", book.path().display());

    let mut resolver = Resolver::new(book, cli);
    let deployment = deploy_all(&mut resolver, &network)?;

    if args.seed_prizes > 0 {
        if network.is_test_net() {
            seed_test_network(&mut resolver, &deployment, args.seed_prizes)?;
        } else {
            warn!("not seeding prizes on {}", network);
        }
    }

    info!("RngOracleStorage: {}", deployment.rng_storage.address);
    info!("NFTContract:      {}", deployment.nft.address);
    info!("Lottery:          {}", deployment.lottery.address);
    Ok(())
}

/// Poll `probe` with exponential backoff, one attempt plus `retries` more.
/// A network mismatch is final and not retried.
fn wait_for_network<S: PassphraseSource>(
    probe: &RpcProbe<S>,
    retries: u32,
) -> Result<Network, Error> {
    let mut delay = Duration::from_secs(1);
    for attempt in 0..=retries {
        if let Some(network) = probe.identify()? {
            return Ok(network);
        }
        if attempt == retries {
            break;
        }
        warn!("network not ready, retrying in {:?} ({}/{})", delay, attempt + 1, retries);
        thread::sleep(delay);
        delay = (delay * 2).min(MAX_BACKOFF);
    }
    Err(Error::NetworkUnavailable)
}
