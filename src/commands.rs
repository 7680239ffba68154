use crate::cli::Command;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use packdrop_registry::{Pack, PackChanges, Registry, UploadOutcome};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

pub(crate) async fn execute(registry: &Registry, command: Command) -> Result<ExitCode> {
    match command {
        Command::List { all } => {
            let packs = if all { registry.all().await } else { registry.main_list().await };
            for pack in packs {
                println!("{}", summary(&pack));
            }
        },
        Command::Show { slug } => {
            let pack = lookup(registry, &slug).await?;
            let sidecar = pack.to_sidecar().or_raise(|| ErrorKind::Registry)?;
            print!("{}", String::from_utf8_lossy(&sidecar));
        },
        Command::Current => {
            let pack = registry.current_main().await.ok_or_raise(|| ErrorKind::Registry)?;
            println!("{}", summary(&pack));
        },
        Command::Upload { slug, file } => {
            let data = read(&file).await?;
            match registry.upload(&slug, &data).await.or_raise(|| ErrorKind::Registry)? {
                UploadOutcome::AlreadyConfigured(pack) => println!("unchanged {}", summary(&pack)),
                UploadOutcome::Promoted(pack) => println!("promoted {slug} -> {}", summary(&pack)),
            }
        },
        Command::Duplicate { slug, file } => {
            let source = lookup(registry, &slug).await?;
            let data = read(&file).await?;
            let draft = registry.duplicate(&source).await.or_raise(|| ErrorKind::Registry)?;
            match registry.upload(&draft.slug, &data).await.or_raise(|| ErrorKind::Registry)? {
                UploadOutcome::Promoted(pack) | UploadOutcome::AlreadyConfigured(pack) => {
                    println!("added {}", summary(&pack));
                },
            }
        },
        Command::Update { slug, changes } => {
            let changes: PackChanges = changes.into();
            if changes.is_empty() {
                exn::bail!(ErrorKind::NothingToUpdate);
            }
            let pack = registry.update(&slug, changes).await.or_raise(|| ErrorKind::Registry)?;
            println!("{}", summary(&pack));
        },
        Command::Download { slug, out } => {
            let data = registry.artifact(&slug).await.or_raise(|| ErrorKind::Registry)?;
            tokio::fs::write(&out, &data).await.or_raise(|| ErrorKind::File(out.clone()))?;
            tracing::info!(slug, path = %out.display(), bytes = data.len(), "Downloaded artifact");
        },
        Command::Matches { slug, file } => {
            lookup(registry, &slug).await?;
            let data = read(&file).await?;
            if registry.content_matches(&slug, &data).await {
                println!("match");
            } else {
                println!("no match");
                return Ok(ExitCode::FAILURE);
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}

async fn lookup(registry: &Registry, slug: &str) -> Result<Arc<Pack>> {
    registry.lookup(slug).await.ok_or_raise(|| ErrorKind::NotFound(slug.to_string()))
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.or_raise(|| ErrorKind::File(path.to_path_buf()))
}

/// One line per pack: slug, version range, flags, name.
fn summary(pack: &Pack) -> String {
    let flags = match (pack.main, pack.is_temporary) {
        (true, true) => "main,draft",
        (true, false) => "main",
        (false, true) => "draft",
        (false, false) => "-",
    };
    format!("{}  {:<16}  {:<10}  {}", pack.slug, pack.minecraft.to_string(), flags, pack.name)
}
