//! recon-runner: command-line driver for the payout reconciliation job.
//!
//! Usage:
//!   recon-runner mockdata --seed 42 --customers 34 --payouts 60 --out ./mock
//!   recon-runner initdb   --db payout.db --data ./mock
//!   recon-runner run      --db payout.db [--config recon.json]
//!   recon-runner show     --db payout.db

use anyhow::{bail, Context, Result};
use chrono::Utc;
use payout_recon_core::{
    config::ReconConfig,
    harness,
    mock::{self, MockConfig},
    model::{Account, Customer, Payout},
    payout_job::{PayoutDataSource, PayoutJob},
    store::DocStore,
    types::Collection,
};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!("usage: recon-runner <mockdata|initdb|run|show> [options]");
    };

    match command {
        "mockdata" => mockdata(&args),
        "initdb" => initdb(&args),
        "run" => run(&args),
        "show" => show(&args),
        other => bail!("unknown command '{other}'"),
    }
}

fn mockdata(args: &[String]) -> Result<()> {
    let seed = parse_arg(args, "--seed", 42u64);
    let defaults = MockConfig::default();
    let config = MockConfig {
        customers: parse_arg(args, "--customers", defaults.customers),
        payouts: parse_arg(args, "--payouts", defaults.payouts),
        ..defaults
    };
    let out = str_arg(args, "--out").unwrap_or("./mock");

    let snapshot = mock::generate(seed, &config, Utc::now());

    fs::create_dir_all(out).with_context(|| format!("cannot create {out}"))?;
    write_json(out, "customers.json", &snapshot.customers)?;
    write_json(out, "accounts.json", &snapshot.accounts)?;
    write_json(out, "payouts.json", &snapshot.payouts)?;

    println!(
        "wrote {} customers, {} accounts, {} payouts to {out}",
        snapshot.customers.len(),
        snapshot.accounts.len(),
        snapshot.payouts.len()
    );
    Ok(())
}

fn initdb(args: &[String]) -> Result<()> {
    let db = str_arg(args, "--db").unwrap_or("example-payout.db");
    let data = str_arg(args, "--data").unwrap_or("./mock");

    let store = DocStore::open(db)?;
    store.migrate()?;

    let customers: Vec<Customer> = read_json(data, "customers.json")?;
    let accounts: Vec<Account> = read_json(data, "accounts.json")?;
    let payouts: Vec<Payout> = read_json(data, "payouts.json")?;

    store.insert_many(Collection::Customers, &customers)?;
    store.insert_many(Collection::Accounts, &accounts)?;
    store.insert_many(Collection::Payouts, &payouts)?;

    println!(
        "loaded {} customers, {} accounts, {} payouts into {db}",
        customers.len(),
        accounts.len(),
        payouts.len()
    );
    Ok(())
}

fn run(args: &[String]) -> Result<()> {
    let config = match str_arg(args, "--config") {
        Some(path) => ReconConfig::load(path)?,
        None => ReconConfig::default(),
    };
    let db = str_arg(args, "--db").unwrap_or(&config.database);
    log::debug!("config: {config:?}");

    let store = DocStore::open(db)?.with_commit_retries(config.commit_max_retries);
    store.migrate()?;

    let job = PayoutJob::new(&config);
    let mut ds = PayoutDataSource::new(&store);
    harness::start(&job, &mut ds, config.harness)?;

    println!("Payout reconciliation committed");
    if let Some(results) = ds.last_commit() {
        for (coll, result) in results {
            println!("  {coll:<10} matched {:>5}  modified {:>5}", result.matched, result.modified);
        }
    }
    Ok(())
}

fn show(args: &[String]) -> Result<()> {
    let db = str_arg(args, "--db").unwrap_or("example-payout.db");
    let store = DocStore::open(db)?;
    store.migrate()?;

    let customers: Vec<Customer> = store.find_all(Collection::Customers)?;
    let accounts: Vec<Account> = store.find_all(Collection::Accounts)?;
    let payouts: Vec<Payout> = store.find_all(Collection::Payouts)?;

    println!("=== {db} ===");
    println!(
        "  customers: {:>5}  banned:    {}",
        customers.len(),
        customers.iter().filter(|c| c.banned).count()
    );
    println!(
        "  accounts:  {:>5}  suspended: {}",
        accounts.len(),
        accounts.iter().filter(|a| a.suspended).count()
    );
    println!(
        "  payouts:   {:>5}  settled:   {}  canceled: {}  pending: {}",
        payouts.len(),
        payouts.iter().filter(|p| p.settled).count(),
        payouts.iter().filter(|p| p.canceled).count(),
        payouts.iter().filter(|p| !p.is_terminal()).count()
    );
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn write_json<T: serde::Serialize>(dir: &str, file: &str, value: &T) -> Result<()> {
    let path = Path::new(dir).join(file);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &str, file: &str) -> Result<T> {
    let path = Path::new(dir).join(file);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
