//! civitas — command-line front end for a civitas community store.

use anyhow::{bail, Context};
use civitas_ballot::KernelRegistry;
use civitas_crypto::SeededIdentity;
use civitas_governance::{GovConfig, GovernanceOrchestrator, ListMotions};
use civitas_motion::{MotionMeta, MotionType, NewMotion, Ref, RefType};
use civitas_policy::{default_policy_for, PolicyRegistry, TracingSink};
use civitas_store_lmdb::LmdbRemote;
use civitas_types::{MotionId, PolicyName, SystemClock, User};
use civitas_utils::init_tracing;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "civitas", about = "Decentralized governance over a versioned community store")]
struct Cli {
    /// Data directory of the LMDB store.
    #[arg(long, env = "CIVITAS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Branch holding community state.
    #[arg(long, env = "CIVITAS_BRANCH")]
    branch: Option<String>,

    /// Further attempts after a conflicting push.
    #[arg(long, env = "CIVITAS_MAX_PUSH_RETRIES")]
    max_push_retries: Option<u32>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CIVITAS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CIVITAS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CIVITAS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Publish community credentials and create the everybody group.
    Boot {
        /// Secret the community identity is derived from.
        #[arg(long, env = "CIVITAS_PASSPHRASE")]
        passphrase: String,
    },
    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage motions.
    Motion {
        #[command(subcommand)]
        action: MotionAction,
    },
    /// Vote on a motion's ballot.
    Vote {
        motion: String,
        #[arg(long)]
        user: String,
        /// Defaults to the ballot's only choice.
        #[arg(long)]
        choice: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        strength: f64,
    },
    /// Refresh tallies and attention of every open motion.
    Process,
    /// Manage references between motions.
    Ref {
        #[command(subcommand)]
        action: RefAction,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(clap::Subcommand)]
enum UserAction {
    Add {
        name: String,
        #[arg(long, default_value_t = 0.0)]
        credits: f64,
    },
    /// Set a property. VALUE is parsed as JSON, falling back to a string.
    Set {
        name: String,
        key: String,
        value: String,
        #[arg(long)]
        overwrite: bool,
    },
    Deposit {
        name: String,
        amount: f64,
    },
    Remove {
        name: String,
    },
    Show {
        name: String,
    },
    List,
}

#[derive(clap::Subcommand)]
enum MotionAction {
    Open {
        id: String,
        /// "concern" or "proposal".
        #[arg(long = "type")]
        motion_type: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long)]
        author: Option<String>,
        /// Defaults to the built-in policy for the motion type.
        #[arg(long)]
        policy: Option<String>,
    },
    Show {
        id: String,
    },
    List {
        #[arg(long)]
        open: bool,
        #[arg(long)]
        by_attention: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "label")]
        labels: Option<Vec<String>>,
    },
    Close {
        id: String,
    },
    Cancel {
        id: String,
    },
    Freeze {
        id: String,
    },
    Unfreeze {
        id: String,
    },
    Archive {
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum RefAction {
    Add {
        from: String,
        to: String,
        #[arg(long = "type")]
        ref_type: String,
    },
    Remove {
        from: String,
        to: String,
        #[arg(long = "type")]
        ref_type: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<GovConfig> {
    let mut config = match &cli.config {
        Some(path) => GovConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GovConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(branch) = &cli.branch {
        config.community_branch = branch.clone();
    }
    if let Some(n) = cli.max_push_retries {
        config.max_push_retries = n;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(config.log_format()?, &config.log_level)?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let remote = LmdbRemote::open(&config.data_dir)
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    tracing::debug!(data_dir = %config.data_dir.display(), branch = %config.community_branch, "store opened");
    let gov = GovernanceOrchestrator::new(
        Arc::new(remote),
        config.clone(),
        Arc::new(PolicyRegistry::builtin(&config.policy_config())),
        Arc::new(KernelRegistry::builtin()),
        Arc::new(SystemClock),
        Arc::new(TracingSink),
    );

    match cli.command {
        Command::Boot { passphrase } => {
            print_json(&gov.boot(&SeededIdentity::from_passphrase(&passphrase))?)?;
        }
        Command::User { action } => match action {
            UserAction::Add { name, credits } => print_json(&gov.add_user(&User::parse(&name)?, credits)?)?,
            UserAction::Set {
                name,
                key,
                value,
                overwrite,
            } => {
                let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
                print_json(&gov.set_user_property(&User::parse(&name)?, &key, value, overwrite)?)?;
            }
            UserAction::Deposit { name, amount } => {
                print_json(&gov.deposit_credits(&User::parse(&name)?, amount)?)?;
            }
            UserAction::Remove { name } => {
                let user = User::parse(&name)?;
                gov.remove_user(&user)?;
                print_json(&user)?;
            }
            UserAction::Show { name } => print_json(&gov.show_user(&User::parse(&name)?)?)?,
            UserAction::List => print_json(&gov.list_users()?)?,
        },
        Command::Motion { action } => run_motion(&gov, action)?,
        Command::Vote {
            motion,
            user,
            choice,
            strength,
        } => {
            let id = MotionId::parse(&motion)?;
            let choice = match choice {
                Some(c) => c,
                None => {
                    let view = gov.show_motion(&id)?;
                    match view.policy.ballot.ad.choices.as_slice() {
                        [only] => only.clone(),
                        choices => bail!("motion {id} has choices {choices:?}; pass --choice"),
                    }
                }
            };
            print_json(&gov.vote(&id, &User::parse(&user)?, &choice, strength)?)?;
        }
        Command::Process => print_json(&gov.process_motions()?)?,
        Command::Ref { action } => {
            let (r, add) = match action {
                RefAction::Add { from, to, ref_type } => (reference(&from, &to, &ref_type)?, true),
                RefAction::Remove { from, to, ref_type } => (reference(&from, &to, &ref_type)?, false),
            };
            let changed = if add { gov.add_ref(&r)? } else { gov.remove_ref(&r)? };
            print_json(&changed)?;
        }
        Command::Config => {}
    }

    let stats = gov.stats();
    tracing::debug!(
        transactions = stats.get("transactions"),
        commits = stats.get("commits"),
        noop_commits = stats.get("noop_commits"),
        conflicts = stats.get("conflicts"),
        "done"
    );
    Ok(())
}

fn reference(from: &str, to: &str, ref_type: &str) -> anyhow::Result<Ref> {
    Ok(Ref::new(
        MotionId::parse(from)?,
        MotionId::parse(to)?,
        RefType::parse(ref_type)?,
    ))
}

fn run_motion(gov: &GovernanceOrchestrator, action: MotionAction) -> anyhow::Result<()> {
    match action {
        MotionAction::Open {
            id,
            motion_type,
            title,
            body,
            url,
            labels,
            author,
            policy,
        } => {
            let motion_type = MotionType::parse(&motion_type)?;
            let policy = match policy {
                Some(p) => PolicyName::parse(&p)?,
                None => default_policy_for(motion_type),
            };
            let spec = NewMotion {
                id: MotionId::parse(&id)?,
                motion_type,
                policy,
                author: author.as_deref().map(User::parse).transpose()?,
                title,
                body,
                tracker_url: url,
                labels,
            };
            print_json(&gov.open_motion(spec)?)
        }
        MotionAction::Show { id } => print_json(&gov.show_motion(&MotionId::parse(&id)?)?),
        MotionAction::List { open, by_attention } => print_json(&gov.list_motions(ListMotions {
            open_only: open,
            by_attention,
        })?),
        MotionAction::Update {
            id,
            title,
            body,
            url,
            labels,
        } => {
            let meta = MotionMeta {
                title,
                body,
                tracker_url: url,
                labels,
            };
            print_json(&gov.update_motion_meta(&MotionId::parse(&id)?, meta)?)
        }
        MotionAction::Close { id } => print_json(&gov.close_motion(&MotionId::parse(&id)?)?),
        MotionAction::Cancel { id } => print_json(&gov.cancel_motion(&MotionId::parse(&id)?)?),
        MotionAction::Freeze { id } => print_json(&gov.freeze_motion(&MotionId::parse(&id)?)?),
        MotionAction::Unfreeze { id } => print_json(&gov.unfreeze_motion(&MotionId::parse(&id)?)?),
        MotionAction::Archive { id } => print_json(&gov.archive_motion(&MotionId::parse(&id)?)?),
    }
}
