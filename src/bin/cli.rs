//! Hotpatch CLI - Main entry point for CLI binary
//!
//! Runs the startup update sequence against a local mirror directory and
//! prints the events a loading screen would receive.

use hotpatch_lib::engine::{
    cli::{formatter::CliFormatter, Cli, Commands, OutputFormat, PrivilegeArg, SourceArgs},
    config::{Config, CONFIG_FILE_NAME},
    events::{EventBus, UpdateEvent},
    hotfix::{ContentKind, ContentManifestClient, HotfixResult, HotfixSynchronizer, HotfixTargets, ManifestEntry},
    local::{CountdownPreload, DirectoryArchiveMounter, DirectoryManifestClient, FileConfigStore, FileLocalizationStore},
    platform::{Platform, StaticPrivilegeGate},
    updater::{StartCheckResult, UpdateOrchestrator},
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run_cli(cli).await {
        CliFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "hotpatch=debug,hotpatch_lib=debug"
    } else {
        "hotpatch=info,hotpatch_lib=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.get_dir();
    let json_output = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Init { force } => cmd_init(&dir, force, json_output)?,
        Commands::Check {
            source,
            hotfix_only,
            repeat,
            privileges,
            login,
            pending_loads,
        } => {
            let config = Config::load_or_default(&dir)?;
            let mut gate = StaticPrivilegeGate::new(PrivilegeArg::combine(&privileges));
            if let Some(user) = login {
                gate = gate.with_platform_login(user);
            }
            let updater = build_orchestrator(&config, &source, gate, pending_loads)?;
            cmd_check(&updater, hotfix_only, repeat.max(1), json_output).await?;
        }
        Commands::Diff { source } => {
            let config = Config::load_or_default(&dir)?;
            let (hotfix, client) = build_synchronizer(&config, &source)?;
            cmd_diff(&hotfix, client.as_ref(), json_output).await?;
        }
    }

    Ok(())
}

fn cmd_init(dir: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::create_dir_all(dir)?;
    Config::default().save(dir)?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "path": path }));
    } else {
        CliFormatter::success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

fn resolve_cache_dir(source: &SourceArgs) -> anyhow::Result<PathBuf> {
    match &source.cache {
        Some(dir) => Ok(dir.clone()),
        None => Platform::current()
            .hotfix_cache_dir()
            .ok_or_else(|| anyhow::anyhow!("no cache directory on this platform, pass --cache")),
    }
}

fn build_synchronizer(
    config: &Config,
    source: &SourceArgs,
) -> anyhow::Result<(Arc<HotfixSynchronizer>, Arc<DirectoryManifestClient>)> {
    let cache_dir = resolve_cache_dir(source)?;
    let client = Arc::new(DirectoryManifestClient::new(&source.source, cache_dir));
    let targets = HotfixTargets::new(
        Arc::new(FileConfigStore::new(&source.config_out)),
        Arc::new(FileLocalizationStore::new()),
        Arc::new(DirectoryArchiveMounter::new()),
    );
    let hotfix = Arc::new(HotfixSynchronizer::new(
        &config.hotfix,
        client.clone(),
        targets,
        EventBus::new(),
    ));
    Ok((hotfix, client))
}

fn build_orchestrator(
    config: &Config,
    source: &SourceArgs,
    gate: StaticPrivilegeGate,
    pending_loads: u32,
) -> anyhow::Result<UpdateOrchestrator> {
    let (hotfix, _) = build_synchronizer(config, source)?;
    Ok(UpdateOrchestrator::new(
        config.update.clone(),
        Arc::new(gate),
        hotfix,
        Arc::new(CountdownPreload::new(pending_loads)),
    ))
}

async fn cmd_check(updater: &UpdateOrchestrator, hotfix_only: bool, repeat: u32, json: bool) -> anyhow::Result<()> {
    let mut events = updater.subscribe();

    for run in 1..=repeat {
        let started = updater.start_check(hotfix_only);
        if json {
            println!("{}", serde_json::json!({ "run": run, "start": started }));
        } else {
            CliFormatter::header(&format!("Update check {} ({:?})", run, started));
        }
        if started == StartCheckResult::AlreadyInProgress {
            continue;
        }

        loop {
            let Some(event) = events.recv().await else {
                anyhow::bail!("event channel closed");
            };
            if json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                CliFormatter::event(&event);
            }
            if matches!(event, UpdateEvent::CheckComplete { .. }) {
                break;
            }
        }
    }

    let snapshot = updater.snapshot();
    let mounted = updater.hotfix().mounted_archives();
    if json {
        println!(
            "{}",
            serde_json::json!({ "snapshot": snapshot, "mounted_archives": mounted })
        );
    } else {
        CliFormatter::header("Summary");
        CliFormatter::kv("State", &format!("{:?}", snapshot.state));
        CliFormatter::kv("Applied files", &updater.hotfix().applied_manifest().len().to_string());
        CliFormatter::kv("Mounted archives", &mounted.len().to_string());
        for entry in &snapshot.cache {
            let when = entry
                .last_success_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            CliFormatter::kv(
                &format!("{:?}", entry.mode),
                &format!("{:?} (last success: {})", entry.last_result, when),
            );
        }
    }
    Ok(())
}

async fn cmd_diff(hotfix: &HotfixSynchronizer, client: &DirectoryManifestClient, json: bool) -> anyhow::Result<()> {
    let result = hotfix.check_availability().await?;
    let rules = hotfix.rules();
    let mut files: Vec<_> = client
        .file_list()
        .into_iter()
        .filter_map(|entry| rules.classify(&entry.display_name).map(|kind| (entry, kind)))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    if json {
        let listing: Vec<_> = files
            .iter()
            .map(|(entry, kind)| serde_json::json!({ "file": entry, "kind": kind }))
            .collect();
        println!("{}", serde_json::json!({ "result": result, "files": listing }));
        return Ok(());
    }

    if result == HotfixResult::Failed {
        CliFormatter::error(&format!("could not enumerate {}", client.source_dir().display()));
        return Ok(());
    }
    CliFormatter::header(&format!("Hotfix content in {}", client.source_dir().display()));
    for (entry, kind) in &files {
        CliFormatter::item(&format!("{} ({:?}, {} bytes)", entry.display_name, kind, entry.size));
    }
    if files.is_empty() {
        CliFormatter::info("no files match this platform and locale");
    } else {
        CliFormatter::kv("Total", &format!("{} bytes", total_bytes(&files)));
    }
    Ok(())
}

fn total_bytes(files: &[(ManifestEntry, ContentKind)]) -> u64 {
    files.iter().map(|(entry, _)| entry.size).sum()
}
