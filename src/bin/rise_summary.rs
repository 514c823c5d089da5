use std::path::PathBuf;
use std::time::Instant;
use anyhow::Context;
use clap::Parser;
use tch::nn::OptimizerConfig;
use tch::{nn, Device};
use rise_net::logger::init_cli_logger;
use rise_net::neural::summary::NetSummary;
use rise_net::neural::training::{compute_loss, train_step};
use rise_net::neural::training_utils::synthetic_batch;
use rise_net::neural::utils::DEVICE;
use rise_net::neural::{RiseConfig, RiseNet};

/// Builds a RISE v3 network and reports its layout.
#[derive(Debug, Parser)]
#[command(name = "rise-summary", version)]
struct Cli {
    /// TOML file with network hyperparameters, defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Run a forward pass and one optimizer step on a random batch of this size
    #[arg(short, long)]
    batch_size: Option<i64>,

    /// Write config and initial weights to this directory
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Stay on the CPU even if CUDA is available
    #[arg(long)]
    cpu: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn smoke_run(net: &RiseNet, batch_size: i64, device: Device) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let batch = synthetic_batch(&net.config, batch_size, device, &mut rng)?;

    let start = Instant::now();
    let output = net.predict(&batch.inputs)?;
    tracing::info!(
        policy = ?output.policy.size(),
        value = ?output.value.size(),
        elapsed = ?start.elapsed(),
        "forward pass"
    );

    let before = compute_loss(net, &batch);
    let mut optimizer = nn::Adam::default().build(&net.vs, 1e-3)?;
    let start = Instant::now();
    let metrics = train_step(net, &mut optimizer, &batch);
    tracing::info!(
        policy_loss = metrics.policy_loss,
        value_loss = metrics.value_loss,
        total_loss = metrics.total_loss,
        loss_before = before.total_loss,
        elapsed = ?start.elapsed(),
        "training step"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => RiseConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RiseConfig::default(),
    };

    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let device = if cli.cpu { Device::Cpu } else { *DEVICE };
    let net = RiseNet::new(device, config)?;
    println!("{}", NetSummary::new(&net));

    if let Some(batch_size) = cli.batch_size {
        anyhow::ensure!(batch_size > 0, "batch size must be positive");
        smoke_run(&net, batch_size, device)?;
    }

    if let Some(dir) = &cli.save {
        net.save_checkpoint(dir)
            .with_context(|| format!("failed to save checkpoint to {}", dir.display()))?;
        println!("Saved checkpoint to {}", dir.display());
    }

    Ok(())
}
