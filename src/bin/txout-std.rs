// Descriptor wallet library extending bitcoin & miniscript functionality
// by LNP/BP Association (https://lnp-bp.org)
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate amplify;

use std::path::PathBuf;
use std::{io, process};

use bitcoin::hashes::hex::{self, FromHex, ToHex};
use bitcoin::{PubkeyHash, PublicKey, Script, ScriptHash};
use clap::{ArgAction, Parser};
use colored::Colorize;
use standard::flags::{
    MANDATORY_SCRIPT_VERIFY_FLAGS, STANDARD_NOT_MANDATORY_VERIFY_FLAGS,
    STANDARD_SCRIPT_VERIFY_FLAGS,
};
use standard::{
    Config, ConfigError, Destination, MultisigError, NonStandardScript, PubkeyScript,
    StandardnessPolicy,
};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser)]
#[derive(Clone, Eq, PartialEq, Debug)]
#[clap(
    author,
    version,
    name = "txout-std",
    about = "Command-line tool for analyzing and constructing standard output scripts"
)]
pub struct Args {
    /// Command to execute
    #[clap(subcommand)]
    pub command: Command,

    /// YAML configuration file with the standardness policy.
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Relay and mine data carrier (`OP_RETURN`) outputs.
    #[clap(long, global = true)]
    pub datacarrier: Option<bool>,

    /// Maximum size of data carrier output scripts, in bytes.
    #[clap(long, global = true)]
    pub datacarrier_size: Option<usize>,

    /// Maximum number of keys in a standard bare multisig.
    #[clap(long, global = true)]
    pub max_multisig_keys: Option<usize>,

    /// Increase verbosity of logging output (may be repeated).
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Command to execute
#[derive(Subcommand)]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Command {
    /// Detect type of the output script and print its template parameters
    Classify {
        /// Output script in hex encoding.
        script: String,
    },

    /// Check output script against the standardness policy
    Check {
        /// Output script in hex encoding.
        script: String,
    },

    /// Extract payment destinations from the output script
    Destinations {
        /// Output script in hex encoding.
        script: String,
    },

    /// Construct P2PKH output script
    Pkh {
        /// Hash160 of the public key.
        hash: PubkeyHash,
    },

    /// Construct P2SH output script
    Sh {
        /// Hash160 of the redeem script.
        hash: ScriptHash,
    },

    /// Construct bare multisig output script
    Multisig {
        /// Number of signatures required to spend the output.
        required: usize,

        /// Public keys, in the order they must appear in the script.
        #[clap(required = true)]
        keys: Vec<PublicKey>,

        /// Data payload (in hex) to append to the script.
        #[clap(short, long)]
        data: Option<String>,
    },

    /// Print script verification flag sets
    Flags,
}

impl Args {
    fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    fn policy(&self) -> Result<StandardnessPolicy, Error> {
        let mut policy = match &self.config {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading configuration");
                Config::load(path)?.policy
            }
            None => StandardnessPolicy::default(),
        };
        if let Some(accept) = self.datacarrier {
            policy.accept_datacarrier = accept;
        }
        if let Some(size) = self.datacarrier_size {
            policy.max_datacarrier_bytes = size;
        }
        if let Some(keys) = self.max_multisig_keys {
            policy.max_multisig_keys = keys;
        }
        tracing::debug!(?policy, "using standardness policy");
        Ok(policy)
    }

    pub fn exec(self) -> Result<(), Error> {
        match &self.command {
            Command::Classify { script } => self.classify(&parse_script(script)?),
            Command::Check { script } => self.check(&parse_script(script)?),
            Command::Destinations { script } => self.destinations(&parse_script(script)?),
            Command::Pkh { hash } => print_script(Destination::KeyId(*hash).script_pubkey()),
            Command::Sh { hash } => print_script(Destination::ScriptId(*hash).script_pubkey()),
            Command::Multisig {
                required,
                keys,
                data,
            } => {
                let script = match data {
                    Some(data) => PubkeyScript::multisig_data(
                        *required,
                        keys,
                        &Vec::<u8>::from_hex(data)?,
                    )?,
                    None => PubkeyScript::multisig(*required, keys)?,
                };
                print_script(script)
            }
            Command::Flags => {
                println!("{:>22} {}", "mandatory".bold(), MANDATORY_SCRIPT_VERIFY_FLAGS);
                println!("{:>22} {}", "standard".bold(), STANDARD_SCRIPT_VERIFY_FLAGS);
                println!(
                    "{:>22} {}",
                    "standard-not-mandatory".bold(),
                    STANDARD_NOT_MANDATORY_VERIFY_FLAGS
                );
                Ok(())
            }
        }
    }

    fn classify(&self, script: &PubkeyScript) -> Result<(), Error> {
        let solution = script.solve();
        println!("{} {}", "type".bold(), solution.txout_type().to_string().yellow());
        println!("{} {}", "script".bold(), script);
        for push in solution.to_pushes() {
            println!("  - {}", push.to_hex());
        }
        println!("{} {}", "sig args".bold(), solution.sig_args_expected());
        Ok(())
    }

    fn check(&self, script: &PubkeyScript) -> Result<(), Error> {
        let txout_type = script.check_standard(&self.policy()?)?;
        println!("{} {} output script", "standard".bright_green(), txout_type);
        Ok(())
    }

    fn destinations(&self, script: &PubkeyScript) -> Result<(), Error> {
        match script.destinations() {
            Some(destinations) => {
                println!(
                    "{} {} of {} ({})",
                    "required".bold(),
                    destinations.required,
                    destinations.addresses.len(),
                    destinations.txout_type.to_string().yellow()
                );
                for destination in destinations.addresses {
                    println!("  - {destination}");
                }
            }
            None => println!(
                "{} {} ({})",
                "destination".bold(),
                Destination::NoDestination,
                script.txout_type().to_string().yellow()
            ),
        }
        Ok(())
    }
}

fn parse_script(hex: &str) -> Result<PubkeyScript, Error> {
    Ok(Script::from_hex(hex.trim())?.into())
}

fn print_script(script: PubkeyScript) -> Result<(), Error> {
    println!("{:x}", script);
    println!("{}", script.to_string().dimmed());
    Ok(())
}

#[derive(Debug, Display, Error, From)]
#[display(inner)]
pub enum Error {
    #[from]
    Config(ConfigError),

    #[from]
    Hex(hex::Error),

    #[from]
    Multisig(MultisigError),

    #[from]
    NonStandard(NonStandardScript),
}

fn main() {
    let args = Args::parse();
    args.init_tracing();
    if let Err(err) = args.exec() {
        eprintln!("{}: {}\n", "Error".bright_red(), err);
        process::exit(1);
    }
}
