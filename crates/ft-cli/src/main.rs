//! fragthread: threaded conversations carried in URL fragments
//!
//! Identity:
//!   keygen                         - mint a login key
//!   register <name>                - add a user whose proof is derived from a login key
//!   login                          - find the user a login key belongs to
//!
//! Editing (as an authenticated user):
//!   post <text> | reply <parent> <text> | like <post>
//!
//! Capsules:
//!   share                          - keyed fragment under a new key
//!   open <fragment>                - open a keyed fragment, print the session key
//!   save                           - keyless fragment under the session key
//!   apply <fragment>               - decode a keyless fragment with the session key

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

use ft_capsule::{CapsuleCodec, LoadState, Session};
use ft_core::config::FragthreadConfig;
use ft_core::{ConversationSnapshot, SystemProvider};
use ft_crypto::SymmetricKey;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fragthread",
    version,
    about = "Serverless threaded conversations in a URL fragment",
    long_about = "fragthread: encode a whole conversation into an encrypted URL fragment, \
                  and log in with nothing but a symmetric key"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "FRAGTHREAD_CONFIG",
        default_value = "~/.config/fragthread/config.toml"
    )]
    config: PathBuf,

    /// Log level (overrides config)
    #[arg(long, env = "FRAGTHREAD_LOG")]
    log: Option<String>,

    /// Log format (overrides config)
    #[arg(long, env = "FRAGTHREAD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint a new login key
    Keygen,

    /// Add a user to a snapshot, proving identity with a login key
    ///
    /// A new login key is minted and printed when --key is not given.
    Register {
        /// Username (also the display name)
        name: String,
        #[arg(long)]
        avatar: Option<u32>,
        /// Existing login key
        #[arg(long, env = "FRAGTHREAD_KEY", hide_env_values = true)]
        key: Option<String>,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Print the username a login key belongs to
    Login {
        #[arg(long, env = "FRAGTHREAD_KEY", hide_env_values = true)]
        key: String,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Start a new thread
    Post {
        text: String,
        #[arg(long, env = "FRAGTHREAD_KEY", hide_env_values = true)]
        key: String,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Reply to a post
    Reply {
        parent: String,
        text: String,
        #[arg(long, env = "FRAGTHREAD_KEY", hide_env_values = true)]
        key: String,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Like a post, or remove an existing like
    Like {
        post: String,
        #[arg(long, env = "FRAGTHREAD_KEY", hide_env_values = true)]
        key: String,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Produce a keyed fragment (and share URL) under a new key
    Share {
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Open a keyed fragment
    Open {
        fragment: String,
        /// Where to write the decoded snapshot
        #[arg(long, short = 'o', default_value = "thread.json")]
        out: PathBuf,
    },

    /// Encode a snapshot as a keyless fragment under the session key
    Save {
        #[arg(long, env = "FRAGTHREAD_SESSION_KEY", hide_env_values = true)]
        session_key: String,
        #[arg(long, short = 's', default_value = "thread.json")]
        snapshot: PathBuf,
    },

    /// Decode a keyless fragment with the session key
    Apply {
        fragment: String,
        #[arg(long, env = "FRAGTHREAD_SESSION_KEY", hide_env_values = true)]
        session_key: String,
        #[arg(long, short = 'o', default_value = "thread.json")]
        out: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

/// A snapshot edit performed as an authenticated user.
enum Edit {
    Post { text: String },
    Reply { parent: String, text: String },
    Like { post: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        compression = %config.codec.compression,
        "fragthread starting"
    );

    let codec = CapsuleCodec::from_config(&config.codec).context("configuring capsule codec")?;

    match cli.command {
        Commands::Keygen => cmd_keygen(),
        Commands::Register { name, avatar, key, snapshot } => {
            let key = key.map(SecretString::from);
            cmd_register(&config, &name, avatar, key.as_ref(), &snapshot).await
        }
        Commands::Login { key, snapshot } => {
            cmd_login(&SecretString::from(key), &snapshot).await
        }
        Commands::Post { text, key, snapshot } => {
            cmd_edit(&SecretString::from(key), &snapshot, Edit::Post { text }).await
        }
        Commands::Reply { parent, text, key, snapshot } => {
            cmd_edit(&SecretString::from(key), &snapshot, Edit::Reply { parent, text }).await
        }
        Commands::Like { post, key, snapshot } => {
            cmd_edit(&SecretString::from(key), &snapshot, Edit::Like { post }).await
        }
        Commands::Share { snapshot } => cmd_share(&config, &codec, &snapshot).await,
        Commands::Open { fragment, out } => cmd_open(&codec, &fragment, &out).await,
        Commands::Save { session_key, snapshot } => {
            cmd_save(&codec, &SecretString::from(session_key), &snapshot).await
        }
        Commands::Apply { fragment, session_key, out } => {
            cmd_apply(&codec, &fragment, &SecretString::from(session_key), &out).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries fragments; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Config and snapshot files ─────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<FragthreadConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(FragthreadConfig::default())
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

async fn read_snapshot(path: &Path) -> Result<ConversationSnapshot> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading snapshot: {}", path.display()))?;
    ConversationSnapshot::from_json(&content)
        .with_context(|| format!("parsing snapshot: {}", path.display()))
}

async fn read_snapshot_or_default(path: &Path) -> Result<ConversationSnapshot> {
    if path.exists() {
        read_snapshot(path).await
    } else {
        tracing::info!(path = %path.display(), "snapshot file not found, starting empty");
        Ok(ConversationSnapshot::default())
    }
}

async fn write_snapshot(path: &Path, snapshot: &ConversationSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("serializing snapshot")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing snapshot: {}", path.display()))
}

fn import_key(secret: &SecretString) -> Result<SymmetricKey> {
    SymmetricKey::import_text(secret.expose_secret()).context("parsing key")
}

// ── Identity ──────────────────────────────────────────────────────────────────

fn cmd_keygen() -> Result<()> {
    let key = ft_crypto::generate();
    println!("{}", key.export_text());
    Ok(())
}

async fn cmd_register(
    config: &FragthreadConfig,
    name: &str,
    avatar: Option<u32>,
    key: Option<&SecretString>,
    path: &Path,
) -> Result<()> {
    let mut snapshot = read_snapshot_or_default(path).await?;
    let avatar = avatar.unwrap_or(config.profile.default_avatar);
    if avatar >= config.profile.avatar_count {
        anyhow::bail!(
            "avatar {avatar} out of range (0..{})",
            config.profile.avatar_count
        );
    }

    let (proof, minted) = match key {
        Some(secret) => {
            let key = import_key(secret)?;
            (ft_crypto::derive_proof(&key, name)?, None)
        }
        None => {
            let (proof, key) = ft_crypto::issue_proof(ft_crypto::generate(), name)?;
            (proof, Some(key))
        }
    };

    snapshot
        .register_user(name, avatar, proof)
        .with_context(|| format!("registering {name}"))?;
    write_snapshot(path, &snapshot).await?;

    println!("Registered {name} in {}", path.display());
    if let Some(key) = minted {
        println!("  login key: {}", key.export_text());
        println!("  (keep it: it is the only way to log in as {name})");
    }
    Ok(())
}

async fn cmd_login(key: &SecretString, path: &Path) -> Result<()> {
    let snapshot = read_snapshot(path).await?;
    let username = ft_capsule::authenticate(&snapshot, &import_key(key)?)
        .context("login failed")?;
    println!("{username}");
    Ok(())
}

async fn cmd_edit(key: &SecretString, path: &Path, edit: Edit) -> Result<()> {
    let mut snapshot = read_snapshot(path).await?;
    let user = ft_capsule::authenticate(&snapshot, &import_key(key)?)
        .context("login failed")?;
    let provider = SystemProvider;

    match edit {
        Edit::Post { text } => {
            let id = snapshot.add_post(&user, &text, &provider)?;
            println!("{id}");
        }
        Edit::Reply { parent, text } => {
            let id = snapshot.add_reply(&parent, &user, &text, &provider)?;
            println!("{id}");
        }
        Edit::Like { post } => {
            let liked = snapshot.toggle_like(&post, &user, &provider)?;
            println!("{}", if liked { "liked" } else { "unliked" });
        }
    }

    write_snapshot(path, &snapshot).await
}

// ── Capsules ──────────────────────────────────────────────────────────────────

async fn cmd_share(config: &FragthreadConfig, codec: &CapsuleCodec, path: &Path) -> Result<()> {
    let snapshot = read_snapshot(path).await?;
    if snapshot.is_empty() {
        tracing::warn!(path = %path.display(), "sharing an empty conversation");
    }
    if let Err(e) = snapshot.validate() {
        tracing::warn!(error = %e, "sharing a snapshot with dangling references");
    }
    let fragment = ft_capsule::produce_share_fragment(codec, &snapshot)
        .context("producing share fragment")?;

    println!("{fragment}");
    eprintln!("url: {}", ft_capsule::share_url(&config.share.base_url, &fragment));
    Ok(())
}

async fn cmd_open(codec: &CapsuleCodec, fragment: &str, out: &Path) -> Result<()> {
    let mut session = Session::new(codec.clone(), ConversationSnapshot::default());
    session.load(Some(fragment)).context("opening fragment")?;

    let key = session
        .session_key()
        .context("opened session holds no key")?
        .export_text();
    let keyless = session.fragment().unwrap_or_default().to_string();

    write_snapshot(out, session.snapshot()).await?;
    println!("{keyless}");
    eprintln!("session key: {key}");
    eprintln!("snapshot written to {}", out.display());
    Ok(())
}

async fn cmd_save(codec: &CapsuleCodec, session_key: &SecretString, path: &Path) -> Result<()> {
    let snapshot = read_snapshot(path).await?;
    let fragment = ft_capsule::save_snapshot(codec, &snapshot, &import_key(session_key)?)
        .context("saving snapshot")?;
    println!("{fragment}");
    Ok(())
}

async fn cmd_apply(
    codec: &CapsuleCodec,
    fragment: &str,
    session_key: &SecretString,
    out: &Path,
) -> Result<()> {
    if ft_capsule::has_embedded_key(fragment) {
        anyhow::bail!("fragment carries its own key; use `fragthread open` for keyed fragments");
    }
    let mut session = Session::with_key(
        codec.clone(),
        ConversationSnapshot::default(),
        import_key(session_key)?,
    );
    let state = session.load(Some(fragment)).context("applying fragment")?;
    debug_assert_eq!(state, LoadState::Updated);

    write_snapshot(out, session.snapshot()).await?;
    eprintln!(
        "applied: {} users, {} posts → {}",
        session.snapshot().users.len(),
        session.snapshot().posts.len(),
        out.display()
    );
    Ok(())
}

fn cmd_config_show(config: &FragthreadConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn expand_tilde_uses_home() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(
            expand_tilde(Path::new("~/x/config.toml")),
            PathBuf::from(home).join("x/config.toml")
        );
        assert_eq!(expand_tilde(Path::new("/etc/x")), PathBuf::from("/etc/x"));
    }

    #[tokio::test]
    async fn missing_config_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("nope.toml")).await.unwrap();
        assert_eq!(config.codec.compression, "deflate");
    }

    #[tokio::test]
    async fn register_login_post_share_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("thread.json");
        let config = FragthreadConfig::default();
        let codec = CapsuleCodec::default();

        let login = ft_crypto::generate().export_text();
        let secret = SecretString::from(login.clone());
        cmd_register(&config, "alice", Some(3), Some(&secret), &path)
            .await
            .unwrap();
        cmd_edit(&secret, &path, Edit::Post { text: "hello".into() })
            .await
            .unwrap();

        let snapshot = read_snapshot(&path).await.unwrap();
        assert_eq!(snapshot.users["alice"].avatar, 3);
        assert_eq!(snapshot.root_post_ids.len(), 1);
        snapshot.validate().unwrap();

        let fragment = ft_capsule::produce_share_fragment(&codec, &snapshot).unwrap();
        let out = tmp.path().join("opened.json");
        cmd_open(&codec, &fragment, &out).await.unwrap();
        assert_eq!(read_snapshot(&out).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn edit_with_unknown_key_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("thread.json");
        let config = FragthreadConfig::default();

        cmd_register(&config, "alice", None, None, &path).await.unwrap();
        let stranger = SecretString::from(ft_crypto::generate().export_text());
        let err = cmd_edit(&stranger, &path, Edit::Post { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no identity proof matches"));
    }

    #[tokio::test]
    async fn register_rejects_out_of_range_avatar() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("thread.json");
        let config = FragthreadConfig::default();

        let err = cmd_register(&config, "alice", Some(99), None, &path)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(!path.exists());
    }
}
