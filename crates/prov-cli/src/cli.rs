use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prov",
    about = "Product provenance ledger: durable records anchored on an external chain",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the product journal
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Ledger gateway base URL; omit to use the simulated chain
    #[arg(long, global = true)]
    pub ledger_endpoint: Option<String>,

    /// Bound on each ledger call, in milliseconds
    #[arg(long, global = true)]
    pub ledger_timeout_ms: Option<u64>,

    /// Wallet recorded as the creator of new products
    #[arg(long, global = true, default_value = "anonymous")]
    pub wallet: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Register a new product
    Create(CreateArgs),
    /// Append a custody-chain stage to a product
    Stage(StageArgs),
    /// Show a product and its on-chain record
    Show(ShowArgs),
    /// List all products
    List,
    /// Find a product by certification hash (or legacy ledger reference)
    FindCert(FindCertArgs),
    /// Print the certification hash of a file
    Digest(DigestArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub origin: String,
    #[arg(long, default_value = "")]
    pub manufacturer: String,
    /// Certificate file whose content is hashed into the record
    #[arg(long)]
    pub certificate: Option<PathBuf>,
    /// Existing ledger reference to keep if anchoring fails
    #[arg(long)]
    pub blockchain_ref: Option<String>,
    /// Stored certificate reference; defaults to the --certificate path
    #[arg(long)]
    pub cert_file: Option<String>,
    #[arg(long)]
    pub image_file: Option<String>,
}

#[derive(Args)]
pub struct StageArgs {
    pub id: String,
    pub stage: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct FindCertArgs {
    pub hash: String,
}

#[derive(Args)]
pub struct DigestArgs {
    pub path: PathBuf,
    /// Fail unless the file's digest matches this certification hash
    #[arg(long, value_name = "HASH")]
    pub check: Option<String>,
}
