//! unifs command-line client.
//!
//! Runs one file operation against the backend named in a TOML config:
//!
//! ```bash
//! unifs --config ~/.config/unifs/ftp.toml ls /pub
//! unifs put ./report.pdf /uploads/report.pdf
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use unifs::config::default_config_path;
use unifs::{AnyFileSystem, BackendConfig, FileInfo, FileSystem};

#[derive(Debug, Parser)]
#[command(name = "unifs", version, about = "File operations on local, FTP and SFTP backends")]
pub struct Cli {
    /// Backend config file (default: $XDG_CONFIG_HOME/unifs/config.toml,
    /// falling back to the local disk)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a directory
    Ls { path: String },
    /// Stream a file to stdout
    Cat { path: String },
    /// Download a file
    Get { remote: String, local: PathBuf },
    /// Upload a file
    Put { local: PathBuf, remote: String },
    /// Create a directory
    Mkdir {
        /// Create missing parents; an existing directory is not an error
        #[arg(short)]
        p: bool,
        path: String,
    },
    /// Remove a directory
    Rmdir {
        /// Remove contents too
        #[arg(short)]
        r: bool,
        path: String,
    },
    /// Remove a file
    Rm { path: String },
    /// Rename or move an entry
    Mv { old: String, new: String },
    /// Print the entry type, or `absent`
    Stat { path: String },
}

/// Resolve which backend to use.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<BackendConfig> {
    if let Some(path) = explicit {
        return BackendConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.is_file() => BackendConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        _ => Ok(BackendConfig::default()),
    }
}

/// Run a command, writing its output to `out`.
///
/// Returns `false` when the command ran but found nothing (`stat` of an
/// absent path).
pub async fn execute<F, W>(fs: &F, command: &Command, out: &mut W) -> Result<bool>
where
    F: FileSystem,
    W: AsyncWrite + Unpin + Send,
{
    match command {
        Command::Ls { path } => {
            let entries = fs
                .list(path)
                .await
                .with_context(|| format!("Failed to list {path}"))?;
            for entry in entries {
                let line = format!(
                    "{}\t{}\t{}\n",
                    entry.file_type().discriminator(),
                    entry.size(),
                    entry.name()
                );
                out.write_all(line.as_bytes()).await?;
            }
        }
        Command::Cat { path } => {
            fs.read_into(path, &mut *out)
                .await
                .with_context(|| format!("Failed to read {path}"))?;
        }
        Command::Get { remote, local } => {
            let mut file = tokio::fs::File::create(local)
                .await
                .with_context(|| format!("Failed to create {}", local.display()))?;
            let copied = fs
                .read_into(remote, &mut file)
                .await
                .with_context(|| format!("Failed to download {remote}"))?;
            file.flush().await?;
            tracing::info!("downloaded {} bytes from {}", copied, remote);
        }
        Command::Put { local, remote } => {
            let file = tokio::fs::File::open(local)
                .await
                .with_context(|| format!("Failed to open {}", local.display()))?;
            fs.put(Box::pin(file), remote)
                .await
                .with_context(|| format!("Failed to upload to {remote}"))?;
            tracing::info!("uploaded {} to {}", local.display(), remote);
        }
        Command::Mkdir { p, path } => fs
            .mkdir(path, *p)
            .await
            .with_context(|| format!("Failed to create directory {path}"))?,
        Command::Rmdir { r, path } => fs
            .rmdir(path, *r)
            .await
            .with_context(|| format!("Failed to remove directory {path}"))?,
        Command::Rm { path } => fs
            .delete(path)
            .await
            .with_context(|| format!("Failed to remove {path}"))?,
        Command::Mv { old, new } => fs
            .rename(old, new)
            .await
            .with_context(|| format!("Failed to move {old} to {new}"))?,
        Command::Stat { path } => {
            let kind = fs
                .exists(path)
                .await
                .with_context(|| format!("Failed to stat {path}"))?;
            let line = match kind {
                Some(kind) => format!("{kind}\n"),
                None => "absent\n".to_string(),
            };
            out.write_all(line.as_bytes()).await?;
            out.flush().await?;
            return Ok(kind.is_some());
        }
    }
    out.flush().await?;
    Ok(true)
}

/// Connect, run the command, close.
pub async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_ref())?;
    tracing::debug!("using {} backend", config.backend_name());
    let fs = AnyFileSystem::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {} backend", config.backend_name()))?;

    let mut stdout = tokio::io::stdout();
    let outcome = execute(&fs, &cli.command, &mut stdout).await;
    fs.close().await.context("Failed to close backend")?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use unifs::LocalFileSystem;

    async fn run_in(fs: &LocalFileSystem, command: Command) -> (bool, String) {
        let mut out = Vec::new();
        let found = execute(fs, &command, &mut out).await.unwrap();
        (found, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["unifs", "--config", "ftp.toml", "mkdir", "-p", "/a/b"]);
        assert_eq!(cli.config, Some(PathBuf::from("ftp.toml")));
        assert!(matches!(cli.command, Command::Mkdir { p: true, ref path } if path == "/a/b"));

        let cli = Cli::parse_from(["unifs", "rmdir", "/a"]);
        assert!(matches!(cli.command, Command::Rmdir { r: false, .. }));
    }

    #[tokio::test]
    async fn test_ls_and_cat() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::rooted(dir.path());
        fs.mkdir("/a/sub", true).await.unwrap();
        fs.put_bytes(b"hello".to_vec(), "/a/b.txt").await.unwrap();

        let (_, listing) = run_in(&fs, Command::Ls { path: "/a".into() }).await;
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "-\t5\tb.txt");
        assert!(lines[1].starts_with("d\t") && lines[1].ends_with("\tsub"));

        let (_, body) = run_in(&fs, Command::Cat { path: "/a/b.txt".into() }).await;
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_stat_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::rooted(dir.path());

        let (found, out) = run_in(&fs, Command::Stat { path: "/nope".into() }).await;
        assert!(!found);
        assert_eq!(out, "absent\n");

        fs.mkdir("/d", false).await.unwrap();
        let (found, out) = run_in(&fs, Command::Stat { path: "/d".into() }).await;
        assert!(found);
        assert_eq!(out, "directory\n");
    }

    #[tokio::test]
    async fn test_put_get_mv_rm() {
        let remote = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::rooted(remote.path());

        let src = local.path().join("src.bin");
        std::fs::write(&src, b"payload").unwrap();
        run_in(&fs, Command::Put { local: src, remote: "/up.bin".into() }).await;
        run_in(&fs, Command::Mv { old: "/up.bin".into(), new: "/moved.bin".into() }).await;

        let dst = local.path().join("dst.bin");
        run_in(&fs, Command::Get { remote: "/moved.bin".into(), local: dst.clone() }).await;
        assert_eq!(std::fs::read(&dst).unwrap(), b"payload");

        run_in(&fs, Command::Rm { path: "/moved.bin".into() }).await;
        assert_eq!(fs.exists("/moved.bin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_carries_context() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::rooted(dir.path());
        let mut out = Vec::new();
        let err = execute(&fs, &Command::Rm { path: "/ghost".into() }, &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to remove /ghost"));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unifs.toml");
        std::fs::write(&path, "backend = \"local\"\nroot = \"/srv\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(
            config,
            BackendConfig::Local {
                root: Some(PathBuf::from("/srv"))
            }
        );
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
