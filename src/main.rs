use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use notes_harness::client::NotesApiClient;
use notes_harness::fixtures::{TEST_DATES, seeded_store};
use notes_harness::logging::HarnessLogger;
use notes_harness::mock::netsim::NetworkProfile;
use notes_harness::mock::router::EntryRouter;
use notes_harness::mock::server::{MockApiServer, shared_handler};
use notes_harness::mock::store::EntryStore;

#[derive(Debug, Parser)]
#[command(name = "notes_harness")]
#[command(about = "Mock entry API server and live-API checker for the notes app")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the mock entry API on a loopback socket.
    Serve(ServeArgs),
    /// Run a create/fetch/delete round trip against a live deployment.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, default_value_t = 0)]
    port: u16,
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
    /// Abort every request at the transport level instead of answering.
    #[arg(long)]
    fail: bool,
    /// Start with the four seed entries instead of an empty store.
    #[arg(long)]
    seed: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    base_url: String,
    #[arg(long, default_value_t = 15)]
    timeout_sec: u64,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Check(args) => check(args),
    };

    if let Err(err) = result {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    let store = if args.seed {
        seeded_store()
    } else {
        EntryStore::new()
    };
    let profile = if args.fail {
        NetworkProfile::slow_failing(Duration::from_millis(args.delay_ms))
    } else {
        NetworkProfile::slow(Duration::from_millis(args.delay_ms))
    };
    let handler = shared_handler(EntryRouter::with_profile(store, profile));
    let logger = HarnessLogger::new()?;
    let server = MockApiServer::start(handler, logger, args.port)?;
    println!("Mock entry API: {}/api/entry", server.base_url());
    println!("Press Ctrl-C to stop.");

    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let logger = HarnessLogger::new()?;
    let client = NotesApiClient::new(args.base_url, Duration::from_secs(args.timeout_sec))?;

    let before = client.all_entries().context("listing entries")?;
    println!("Entries before check: {}", before.len());

    let marker = format!("harness check {}", Uuid::new_v4());
    client
        .create_entry(&marker, TEST_DATES.future_date)
        .context("creating check entry")?;
    logger.info(&format!("created check entry: {marker}"));

    let matching = client
        .entries_for_date(TEST_DATES.future_date)
        .context("fetching check entry back")?;
    let Some(created) = matching.iter().find(|entry| entry.name == marker) else {
        bail!("check entry did not come back on date lookup");
    };
    println!("Round trip ok: id={} date={}", created.id, created.created_date);

    client
        .delete_entry(&created.id)
        .context("deleting check entry")?;
    logger.info(&format!("deleted check entry id={}", created.id));
    println!("Cleanup ok.");
    Ok(())
}
