use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::DeployError;
use crate::network::PassphraseSource;
use crate::plan::wasm_stem;
use crate::resolver::{Deployer, InitArg};

/// The part of `stellar network info --output json` read here.
#[derive(Debug, Deserialize)]
struct NetworkInfo {
    passphrase: String,
}

/// [`Deployer`] backed by the `stellar` command line tool.
#[derive(Debug, Clone)]
pub struct StellarCli {
    pub binary: PathBuf,
    pub wasm_dir: PathBuf,
    /// Network alias as configured in the CLI.
    pub network: String,
    /// Signing identity.
    pub source: String,
}

impl StellarCli {
    fn run(&self, args: &[String]) -> Result<String, DeployError> {
        debug!("{} {}", self.binary.display(), args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| DeployError(format!("spawning {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim().to_owned())
    }

    fn common(&self) -> Vec<String> {
        vec![
            "--source".to_owned(),
            self.source.clone(),
            "--network".to_owned(),
            self.network.clone(),
        ]
    }
}

impl Deployer for StellarCli {
    fn deploy(&mut self, source: &str, args: &[InitArg]) -> Result<String, DeployError> {
        let stem = wasm_stem(source)
            .ok_or_else(|| DeployError(format!("no wasm artifact known for {source}")))?;
        let wasm = self.wasm_dir.join(format!("{stem}.wasm"));

        let mut cmd = vec![
            "contract".to_owned(),
            "deploy".to_owned(),
            "--wasm".to_owned(),
            wasm.display().to_string(),
        ];
        cmd.extend(self.common());
        let out = self.run(&cmd)?;

        // The contract id is printed last.
        let address = out
            .lines()
            .last()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| DeployError(format!("deploy of {source} printed no contract id")))?
            .to_owned();

        if !args.is_empty() {
            self.invoke(&address, "init", args)?;
        }
        Ok(address)
    }

    fn invoke(
        &mut self,
        address: &str,
        function: &str,
        args: &[InitArg],
    ) -> Result<String, DeployError> {
        let mut cmd = vec![
            "contract".to_owned(),
            "invoke".to_owned(),
            "--id".to_owned(),
            address.to_owned(),
        ];
        cmd.extend(self.common());
        cmd.push("--".to_owned());
        cmd.push(function.to_owned());
        for arg in args {
            cmd.push(format!("--{}", arg.name));
            cmd.push(arg.value.clone());
        }
        self.run(&cmd)
    }
}

impl PassphraseSource for StellarCli {
    /// Ask the RPC behind the configured alias, so the network identity and
    /// the deployment target can never diverge.
    fn reported_passphrase(&self) -> Result<String, DeployError> {
        let out = self.run(&[
            "network".to_owned(),
            "info".to_owned(),
            "--network".to_owned(),
            self.network.clone(),
            "--output".to_owned(),
            "json".to_owned(),
        ])?;
        let info: NetworkInfo = serde_json::from_str(&out)
            .map_err(|e| DeployError(format!("unexpected network info output: {e}")))?;
        Ok(info.passphrase)
    }
}
