use anyhow::{Context, Result};
use hdkeys_key_deriv::{
    derive_path_with, master_from_seed, neuter, DerivationPath, DeriveConfig, ExtendedKey,
    Network,
};
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::{DeriveArgs, InspectArgs, MasterArgs, NeuterArgs};

pub(crate) fn handle_master(args: MasterArgs, network: Network) -> Result<()> {
    let master = master_key(&args.seed, network)?;
    info!(%network, fingerprint = %master.fingerprint(), "created master key");

    println!("{master}");
    Ok(())
}

pub(crate) fn handle_derive(
    args: DeriveArgs,
    network: Network,
    config: &DeriveConfig,
) -> Result<()> {
    let key = derive(&args, network, config)?;
    info!(path = %args.path, depth = key.depth(), "derived key");

    if args.public {
        println!("{}", neuter(&key));
    } else {
        println!("{key}");
    }
    Ok(())
}

pub(crate) fn handle_neuter(args: NeuterArgs) -> Result<()> {
    let key = parse_key(&args.key)?;
    println!("{}", neuter(&key));
    Ok(())
}

pub(crate) fn handle_inspect(args: InspectArgs) -> Result<()> {
    let key = parse_key(&args.key)?;
    print!("{}", describe(&key));
    Ok(())
}

fn derive(args: &DeriveArgs, network: Network, config: &DeriveConfig) -> Result<ExtendedKey> {
    let path: DerivationPath = args
        .path
        .parse()
        .with_context(|| format!("invalid path {}", args.path))?;

    let root = match (&args.seed, &args.key) {
        (Some(seed), _) => master_key(seed, network)?,
        (None, Some(key)) => parse_key(key)?,
        (None, None) => anyhow::bail!("either --seed or --key is required"),
    };

    Ok(derive_path_with(&root, &path, config)?)
}

/// Decodes a hex seed and derives its master key. The decoded seed is wiped afterwards.
fn master_key(seed_hex: &str, network: Network) -> Result<ExtendedKey> {
    let seed = Zeroizing::new(hex::decode(seed_hex.trim()).context("seed must be hex")?);
    Ok(master_from_seed(&seed, network)?)
}

fn parse_key(text: &str) -> Result<ExtendedKey> {
    text.trim()
        .parse()
        .context("could not decode extended key")
}

/// Human-readable summary of the public fields of a key.
fn describe(key: &ExtendedKey) -> String {
    format!(
        "network: {}\n\
         version: {}\n\
         private: {}\n\
         depth: {}\n\
         parent fingerprint: {}\n\
         child number: {}\n\
         fingerprint: {}\n\
         chain code: {}\n\
         public key: {}\n",
        key.network(),
        key.version(),
        key.is_private(),
        key.depth(),
        key.parent_fingerprint(),
        key.child_number(),
        key.fingerprint(),
        hex::encode(key.chain_code().as_bytes()),
        hex::encode(key.public_key().serialize()),
    )
}
