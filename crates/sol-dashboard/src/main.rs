use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chain_sol::{derive_associated_token_address, lamports_to_sol_string, Pubkey};
use clap::{ArgAction, Parser, Subcommand};
use ed25519_dalek::SigningKey;
use rpassword::prompt_password;
use secrecy::{ExposeSecret, SecretString};
use sol_dashboard::{Config, ConsoleNotifier, Dashboard};
use sol_rpc::{Cluster, RpcClient};
use tracing::info;
use wallet_core::{
    derive_solana_key, generate_mnemonic, mnemonic_to_seed, validate_mnemonic, Keyfile,
    KeypairWallet, WalletSource,
};
use zeroize::Zeroizing;

const PASSWORD_ENV: &str = "SOL_DASH_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "sol-dash")]
#[command(about = "Solana wallet dashboard: balances, token accounts and SOL transfers", long_about = None)]
struct Args {
    /// Config file (default: <config dir>/sol-dashboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cluster: mainnet-beta, devnet, testnet, localnet or an RPC URL
    #[arg(long, env = "SOL_DASH_CLUSTER", global = true)]
    cluster: Option<Cluster>,

    /// RPC endpoint, overrides the cluster URL
    #[arg(long, env = "SOL_DASH_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Encrypted keyfile
    #[arg(long, env = "SOL_DASH_KEYFILE", global = true)]
    keyfile: Option<PathBuf>,

    /// More logging (-v for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new mnemonic and write an encrypted keyfile
    Keygen {
        #[arg(long, default_value_t = 0)]
        account: u32,
        /// Overwrite an existing keyfile
        #[arg(long)]
        force: bool,
    },
    /// Import a mnemonic into an encrypted keyfile
    Import {
        #[arg(long, default_value_t = 0)]
        account: u32,
        #[arg(long)]
        force: bool,
    },
    /// Print the wallet address
    Address,
    /// Print the SOL balance
    Balance,
    /// List token balances
    Tokens,
    /// Find a token account by symbol
    Resolve {
        #[arg(long)]
        symbol: Option<String>,
        /// Account owner (default: configured recipient)
        #[arg(long)]
        owner: Option<String>,
    },
    /// Send SOL and wait for confirmation
    Send {
        #[arg(long)]
        to: String,
        /// Amount in SOL, e.g. 0.001
        #[arg(long)]
        amount: String,
    },
    /// Connect, refresh and print the whole dashboard
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let fallback = if args.verbose > 0 {
        "sol_dashboard=debug,sol_rpc=debug,wallet_core=debug"
    } else {
        "sol_dashboard=info,sol_rpc=info,wallet_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    info!(cluster = %config.cluster, rpc = config.rpc_url(), "sol-dash");

    match args.command {
        Command::Keygen { account, force } => keygen(&config, account, force),
        Command::Import { account, force } => import(&config, account, force),
        Command::Address => {
            let keyfile = Keyfile::load(&config.keyfile)
                .with_context(|| format!("no wallet at {}", config.keyfile.display()))?;
            println!("{}", keyfile.pubkey);
            Ok(())
        }
        Command::Balance => {
            let dash = connected_dashboard(config).await?;
            let Some(lamports) = dash.state().sol_balance else {
                bail!("balance unavailable");
            };
            println!("{} SOL", lamports_to_sol_string(lamports));
            Ok(())
        }
        Command::Tokens => {
            let dash = connected_dashboard(config).await?;
            for row in &dash.state().token_balances {
                println!(
                    "{}  {}: {} tokens",
                    row.account, row.symbol, row.amount.ui_amount_string
                );
            }
            Ok(())
        }
        Command::Resolve { symbol, owner } => resolve(config, symbol, owner).await,
        Command::Send { to, amount } => {
            let mut config = config;
            config.recipient = Some(to);
            let mut dash = connected_dashboard(config).await?;
            dash.set_amount(&amount);
            match dash.send_sol().await {
                Some(signature) => {
                    println!("{signature}");
                    Ok(())
                }
                None => bail!("transfer failed"),
            }
        }
        Command::Show => {
            let mut dash = connected_dashboard(config).await?;
            dash.resolve_token_address().await;
            print!("{}", dash.render());
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&path)?;
    if let Some(cluster) = &args.cluster {
        config.cluster = cluster.clone();
    }
    if let Some(url) = &args.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    if let Some(keyfile) = &args.keyfile {
        config.keyfile = keyfile.clone();
    }
    Ok(config)
}

type CliDashboard = Dashboard<RpcClient, KeypairWallet, ConsoleNotifier>;

fn dashboard(config: Config, wallet: KeypairWallet) -> Result<CliDashboard> {
    let rpc = RpcClient::with_timeout(config.rpc_url(), config.request_timeout())
        .context("failed to build RPC client")?
        .with_preflight_commitment(config.commitment);
    Ok(Dashboard::new(rpc, wallet, ConsoleNotifier, config))
}

async fn connected_dashboard(config: Config) -> Result<CliDashboard> {
    let password = read_password(false)?;
    let wallet = KeypairWallet::new(WalletSource::Keyfile {
        path: config.keyfile.clone(),
        password,
    });
    let mut dash = dashboard(config, wallet)?;
    dash.connect_wallet()
        .await
        .context("failed to connect wallet")?;
    Ok(dash)
}

async fn resolve(mut config: Config, symbol: Option<String>, owner: Option<String>) -> Result<()> {
    if let Some(symbol) = symbol {
        config.token_symbol = symbol;
    }
    if let Some(owner) = owner {
        config.recipient = Some(owner);
    }
    let Some(owner) = config.recipient.clone() else {
        bail!("no owner: pass --owner or set `recipient` in the config");
    };

    let wallet = KeypairWallet::new(WalletSource::Keyfile {
        path: config.keyfile.clone(),
        password: SecretString::from(String::new()),
    });
    let mut dash = dashboard(config, wallet)?;

    if let Some(account) = dash.resolve_token_address().await {
        println!("{account}");
        return Ok(());
    }

    // Point at where the account would live if it were created.
    let symbol = &dash.state().token_symbol;
    if let (Ok(owner), Some(mint)) = (owner.parse::<Pubkey>(), dash.registry().mint_for(symbol)) {
        let ata = derive_associated_token_address(&owner, &mint, &dash.config().token_program_id)?;
        eprintln!("associated {symbol} account for {owner} would be {ata}");
    }
    bail!("no {symbol} token account found")
}

fn keygen(config: &Config, account: u32, force: bool) -> Result<()> {
    ensure_writable(&config.keyfile, force)?;
    let phrase = generate_mnemonic()?;
    let seed = mnemonic_to_seed(&phrase, "")?;
    let key = derive_solana_key(seed.as_slice(), account)?;

    println!("Write down this recovery phrase and keep it offline:\n");
    println!("{}\n", phrase.expose_secret());

    let pubkey = write_keyfile(&config.keyfile, &key)?;
    println!("{pubkey}");
    Ok(())
}

fn import(config: &Config, account: u32, force: bool) -> Result<()> {
    ensure_writable(&config.keyfile, force)?;
    let phrase = SecretString::from(
        prompt_password("Recovery phrase: ").context("failed to read recovery phrase")?,
    );
    if !validate_mnemonic(phrase.expose_secret()) {
        bail!("not a valid BIP-39 recovery phrase");
    }
    let seed = mnemonic_to_seed(&phrase, "")?;
    let key = derive_solana_key(seed.as_slice(), account)?;

    let pubkey = write_keyfile(&config.keyfile, &key)?;
    println!("{pubkey}");
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

fn write_keyfile(path: &Path, key: &SigningKey) -> Result<Pubkey> {
    let password = read_password(true)?;
    let keyfile = Keyfile::encrypt(key, password.expose_secret().as_bytes())?;
    keyfile
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "keyfile saved");
    Ok(keyfile.pubkey)
}

/// Keyfile password from `SOL_DASH_PASSWORD`, else an interactive prompt.
fn read_password(confirm: bool) -> Result<SecretString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(password));
    }

    let first = Zeroizing::new(
        prompt_password("Keyfile password: ").context("failed to read keyfile password")?,
    );
    if confirm {
        let second = Zeroizing::new(
            prompt_password("Confirm password: ").context("failed to confirm keyfile password")?,
        );
        if *first != *second {
            bail!("passwords did not match");
        }
    }
    Ok(SecretString::from(first.to_string()))
}
