use anyhow::Context;
use colored::Colorize;
use prov_core::{Coordinator, OpContext, ReadOutcome};
use prov_crypto::ContentHasher;
use prov_server::{ProvServer, ServerConfig};
use prov_types::{Anchoring, Product, ProductInput};
use serde::Serialize;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let ctx = OpContext::new(cli.wallet.clone());
    let format = cli.format;

    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Digest(args) => cmd_digest(args, format),
        command => {
            let coordinator = ProvServer::new(config).coordinator()?;
            match command {
                Command::Create(args) => cmd_create(&coordinator, &ctx, args, format).await,
                Command::Stage(args) => cmd_stage(&coordinator, &ctx, args, format).await,
                Command::Show(args) => {
                    let outcome = coordinator.read_product(&ctx, &args.id).await?;
                    print_read(&outcome, format)
                }
                Command::FindCert(args) => {
                    let outcome = coordinator
                        .read_by_certification_hash(&ctx, &args.hash)
                        .await?;
                    print_read(&outcome, format)
                }
                Command::List => cmd_list(&coordinator, &ctx, format),
                Command::Serve(_) | Command::Digest(_) => Ok(()),
            }
        }
    }
}

/// Config file (if any), then command-line overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(endpoint) = &cli.ledger_endpoint {
        config.ledger.endpoint = Some(endpoint.clone());
    }
    if let Some(ms) = cli.ledger_timeout_ms {
        config.ledger.timeout_ms = ms;
    }
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        ledger = config.ledger.endpoint.as_deref().unwrap_or("simulated"),
        timeout_ms = config.ledger.timeout_ms,
        "configuration resolved"
    );
    Ok(config)
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "{} provenance server on {} (data: {})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.data_dir.display()
    );
    ProvServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_create(
    coordinator: &Coordinator,
    ctx: &OpContext,
    args: CreateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let certificate = match &args.certificate {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("cannot read certificate {}", path.display()))?,
        ),
        None => None,
    };
    let cert_file = args
        .cert_file
        .or_else(|| args.certificate.as_ref().map(|p| p.display().to_string()));
    let input = ProductInput {
        product_id: args.id,
        name: args.name,
        origin: args.origin,
        manufacturer: args.manufacturer,
        blockchain_ref_hash: args.blockchain_ref,
        cert_file,
        image_file: args.image_file,
    };

    let outcome = coordinator
        .create_product(ctx, input, certificate.as_deref())
        .await?;
    if format == OutputFormat::Json {
        return print_json(&outcome);
    }
    println!(
        "{} Product {} created",
        "✓".green().bold(),
        outcome.product.product_id().to_string().yellow()
    );
    print_anchoring(&outcome.anchoring, &outcome.transaction_ref);
    print_product(&outcome.product);
    Ok(())
}

async fn cmd_stage(
    coordinator: &Coordinator,
    ctx: &OpContext,
    args: StageArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let outcome = coordinator.append_stage(ctx, &args.id, &args.stage).await?;
    if format == OutputFormat::Json {
        return print_json(&outcome);
    }
    println!(
        "{} Stage {} appended to {}",
        "✓".green().bold(),
        args.stage.cyan(),
        args.id.yellow()
    );
    print_anchoring(&outcome.anchoring, outcome.product.blockchain_ref_hash());
    print_product(&outcome.product);
    Ok(())
}

fn cmd_list(coordinator: &Coordinator, ctx: &OpContext, format: OutputFormat) -> anyhow::Result<()> {
    let products = coordinator.list_products(ctx)?;
    if format == OutputFormat::Json {
        return print_json(&products);
    }
    if products.is_empty() {
        println!("No products.");
        return Ok(());
    }
    for p in &products {
        println!(
            "{}  {}  {}  {}",
            p.product_id().to_string().yellow().bold(),
            p.name(),
            p.current_stage().unwrap_or("-").cyan(),
            p.blockchain_ref_hash().dimmed()
        );
    }
    Ok(())
}

fn cmd_digest(args: DigestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = std::fs::read(&args.path)
        .with_context(|| format!("cannot read {}", args.path.display()))?;
    let hasher = ContentHasher::CERTIFICATE;
    let digest = hasher.digest(&content);
    let matches = args.check.as_deref().map(|expected| hasher.verify(&content, expected));

    if format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "path": args.path.display().to_string(),
            "certificationHash": digest,
            "matches": matches,
        }))?;
    } else {
        println!("{}  {}", digest, args.path.display());
        match matches {
            Some(true) => println!("{} certificate matches", "✓".green().bold()),
            Some(false) => println!("{} certificate does not match", "✗".red().bold()),
            None => {}
        }
    }
    if matches == Some(false) {
        anyhow::bail!("{} does not match the expected certification hash", args.path.display());
    }
    Ok(())
}

fn print_read(outcome: &ReadOutcome, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(outcome);
    }
    print_product(&outcome.product);
    match &outcome.on_chain {
        Some(record) => println!("  On-chain:      {}", serde_json::to_string_pretty(record)?),
        None => println!("  On-chain:      {}", "unavailable".dimmed()),
    }
    Ok(())
}

fn print_anchoring(anchoring: &Anchoring, reference: &str) {
    match anchoring {
        Anchoring::Anchored { tx_ref } => println!("  Anchored:      {}", tx_ref.green()),
        Anchoring::Unanchored { reason } => {
            println!("  {} {}", "Not anchored:".red(), reason);
            println!("  Reference:     {}", reference.yellow());
        }
    }
}

fn print_product(p: &Product) {
    println!("  Product:       {}", p.product_id().to_string().bold());
    println!("  Name:          {}", p.name());
    println!("  Origin:        {}", p.origin());
    println!("  Manufacturer:  {}", p.manufacturer());
    println!("  Certification: {}", p.certification_hash().cyan());
    println!("  Ledger ref:    {}", p.blockchain_ref_hash().dimmed());
    println!("  Created by:    {}", p.created_by_wallet());
    if let Some(image) = p.image_file() {
        println!("  Image:         {}", image);
    }
    if !p.stages().is_empty() {
        println!("  Stages:        {}", p.stages().join(" → "));
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
