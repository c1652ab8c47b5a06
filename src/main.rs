use anyhow::{Context, Result};
use clap::Parser;
use rits_migrate::{
    LogNotifier, MemoryWorld, MigrationConfig, MigrationRunner, WorldFile, register_system_settings,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rits-migrate")]
#[command(about = "Migrates an exported RITS world to the current data schema")]
struct Cli {
    /// Exported world (JSON with actors, scenes and settings)
    #[arg(long)]
    world: PathBuf,

    /// Where to write the migrated world; defaults to overwriting --world
    #[arg(long)]
    out: Option<PathBuf>,

    /// JSON file with migration settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Version recorded once the migration finishes
    #[arg(long)]
    target_version: Option<String>,

    /// Print the updates that would be sent, change nothing
    #[arg(long)]
    dry_run: bool,

    /// Migrate even if the stored version says it is not needed
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MigrationConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?,
        None => MigrationConfig::default(),
    };
    if let Some(version) = &cli.target_version {
        config = config.target_version(version);
    }

    let source = WorldFile::new(&cli.world);
    let snapshot = source
        .load()
        .await
        .with_context(|| format!("Failed to load world '{}'", cli.world.display()))?;

    for record in &snapshot.unreadable {
        eprintln!(
            "Unreadable {} record {} ({}) left unmigrated: {}",
            record.collection,
            record.index,
            record.id().unwrap_or("no id"),
            record.error
        );
    }

    let world = Arc::new(MemoryWorld::from_snapshot(snapshot));
    register_system_settings(world.as_ref(), &config).await?;

    let runner = MigrationRunner::new(world.clone(), world.clone(), Arc::new(LogNotifier))
        .with_config(config);

    if cli.dry_run {
        for planned in runner.plan().await? {
            match &planned.payload {
                Ok(payload) if payload.is_empty() => {}
                Ok(payload) => println!(
                    "{} '{}' ({}): {}",
                    planned.step,
                    planned.record_name,
                    planned.record_id,
                    payload.to_host_json()
                ),
                Err(err) => println!(
                    "{} '{}' ({}): FAILS: {}",
                    planned.step, planned.record_name, planned.record_id, err
                ),
            }
        }
        return Ok(());
    }

    let report = if cli.force {
        runner.run().await
    } else {
        match runner.run_if_needed().await {
            Some(report) => report,
            None => {
                println!("World is already migrated; nothing to do.");
                return Ok(());
            }
        }
    };

    for failure in report.failures() {
        eprintln!(
            "{} '{}' ({}): {:?}",
            failure.step, failure.record_name, failure.record_id, failure.status
        );
    }
    println!("{}", report);

    let target = WorldFile::new(cli.out.as_ref().unwrap_or(&cli.world));
    target
        .save(&world.snapshot().await)
        .await
        .with_context(|| format!("Failed to write world '{}'", target.path().display()))?;
    Ok(())
}
