//! # BigDataOps CLI Tool
//!
//! Command-line interface for the BigDataOps admin platform. Provides backend
//! health checking, session management, and read access to alert rules, LDAP
//! accounts, and cluster state.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use bigdataops_client::services::{
    AlertService, AuthService, ClusterService, HistoryListQuery, HistoryStatus, LdapService,
    NodesQuery, RuleListQuery, Severity,
};
use bigdataops_client::{
    ApiError, ApiGateway, ClientConfig, ClientEvent, HealthMonitor, NoticeLevel, Notifier,
    SessionStore,
};

#[derive(Parser, Debug)]
#[command(name = "bdops")]
#[command(about = "Command-line interface for the BigDataOps admin platform")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path (default: ~/.bigdataops/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL from configuration
    #[arg(long)]
    api_url: Option<String>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Probe backend liveness once and print the result
    Health,

    /// Run the liveness monitor and print notices until interrupted
    Watch,

    /// Sign in and persist the session (password read from stdin)
    Login {
        /// Account name
        username: String,
    },

    /// Clear the persisted session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Alert rule and history operations
    #[command(subcommand)]
    Alerts(AlertCommands),

    /// LDAP directory operations
    #[command(subcommand)]
    Ldap(LdapCommands),

    /// Cluster monitoring operations
    #[command(subcommand)]
    Cluster(ClusterCommands),
}

#[derive(Debug, Subcommand)]
enum AlertCommands {
    /// List alert rules
    Rules {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: i64,
        /// Page size
        #[arg(short, long, default_value = "20")]
        size: i64,
        /// Filter by component category (hdfs, hive, mysql, ...)
        #[arg(long)]
        category: Option<String>,
        /// Filter by severity (low, medium, high, critical)
        #[arg(long)]
        severity: Option<String>,
    },
    /// List alert history
    History {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: i64,
        /// Page size
        #[arg(short, long, default_value = "20")]
        size: i64,
    },
    /// Show evaluation engine status
    Engine,
}

#[derive(Debug, Subcommand)]
enum LdapCommands {
    /// List directory users
    Users {
        /// LDAP environment name
        #[arg(short, long, default_value = "default")]
        env: String,
    },
    /// List directory groups
    Groups {
        /// LDAP environment name
        #[arg(short, long, default_value = "default")]
        env: String,
    },
}

#[derive(Debug, Subcommand)]
enum ClusterCommands {
    /// Show the fleet-wide summary
    Overview,
    /// List cluster nodes
    Nodes {
        /// Filter by node status (up, down)
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        ClientConfig::load_from_file(config_path)?
    } else {
        ClientConfig::load()?
    };

    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    info!(api_url = %config.api.base_url, "BigDataOps CLI starting");

    let session_path = match &config.session_file {
        Some(path) => path.clone(),
        None => ClientConfig::default_session_path()?,
    };
    let session = SessionStore::with_file(session_path);
    let notifier = Notifier::new();
    let gateway = ApiGateway::new(&config, session, notifier.clone())?;

    let result = match cli.command {
        Commands::Health => health_command(&config).await,
        Commands::Watch => watch_command(&config, notifier).await,
        Commands::Login { username } => login_command(&gateway, &username).await,
        Commands::Logout => logout_command(&gateway),
        Commands::Whoami => whoami_command(&gateway).await,
        Commands::Alerts(cmd) => handle_alert_command(cmd, &gateway).await,
        Commands::Ldap(cmd) => handle_ldap_command(cmd, &gateway).await,
        Commands::Cluster(cmd) => handle_cluster_command(cmd, &gateway).await,
    };

    if let Err(error) = &result {
        if let Some(api_error) = error.downcast_ref::<ApiError>() {
            if api_error.is_auth() {
                eprintln!("Session expired: run `bdops login <username>` to sign in again");
            }
        }
    }

    result
}

async fn health_command(config: &ClientConfig) -> anyhow::Result<()> {
    let monitor = HealthMonitor::new(config, Notifier::new())?;
    monitor.check_now().await;

    let state = monitor.state();
    if state.healthy {
        println!("✓ Backend is healthy");
    } else {
        println!("✗ Backend is unreachable or unhealthy");
    }
    if let Some(checked_at) = state.last_checked_at {
        println!("  Checked at: {} UTC", checked_at.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

async fn watch_command(config: &ClientConfig, notifier: Notifier) -> anyhow::Result<()> {
    let monitor = HealthMonitor::new(config, notifier.clone())?;
    let mut events = notifier.subscribe();
    monitor.start();

    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        config.api.base_url, config.health.interval_secs
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ClientEvent::Notice(notice)) => {
                    let icon = match notice.level {
                        NoticeLevel::Success => "✓",
                        NoticeLevel::Warning => "!",
                        NoticeLevel::Error => "✗",
                    };
                    println!("{} {}", icon, notice.message);
                }
                Ok(ClientEvent::SessionExpired) => {
                    println!("! Session expired");
                }
                // A lagged receiver only means we missed notices; keep watching.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await;
    println!("Stopped");
    Ok(())
}

async fn login_command(gateway: &ApiGateway, username: &str) -> anyhow::Result<()> {
    eprint!("Password: ");
    std::io::stderr().flush().ok();

    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .context("failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);

    let auth = AuthService::new(gateway.clone());
    let response = auth.login(username, password).await?;
    println!("✓ Signed in as {}", response.username);
    Ok(())
}

fn logout_command(gateway: &ApiGateway) -> anyhow::Result<()> {
    if gateway.session().is_authenticated() {
        AuthService::new(gateway.clone()).logout();
        println!("✓ Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

async fn whoami_command(gateway: &ApiGateway) -> anyhow::Result<()> {
    let Some(username) = gateway.session().username() else {
        println!("Not signed in");
        return Ok(());
    };

    println!("Signed in as {}", username);

    let auth = AuthService::new(gateway.clone());
    let profile = auth.current_user().await?;
    println!("  UID: {}", profile.uid);
    if let Some(email) = profile.email {
        println!("  Email: {}", email);
    }
    if !profile.groups.is_empty() {
        println!("  Groups: {}", profile.groups.join(", "));
    }
    Ok(())
}

async fn handle_alert_command(cmd: AlertCommands, gateway: &ApiGateway) -> anyhow::Result<()> {
    let alerts = AlertService::new(gateway.clone());

    match cmd {
        AlertCommands::Rules {
            page,
            size,
            category,
            severity,
        } => {
            let level = severity.as_deref().map(parse_severity).transpose()?;
            let query = RuleListQuery {
                page,
                size,
                category,
                level,
                ..Default::default()
            };

            let rules = alerts.rules(&query).await?;
            println!("Alert rules ({} total)", rules.total);
            for rule in rules.items {
                let state = if rule.enabled { "enabled" } else { "disabled" };
                println!(
                    "  [{}] {} ({}) {} {} | {} {}",
                    rule.id,
                    rule.name,
                    rule.category,
                    rule.level.as_str(),
                    state,
                    rule.promql,
                    rule.condition
                );
            }
        }
        AlertCommands::History { page, size } => {
            let query = HistoryListQuery {
                page,
                size,
                ..Default::default()
            };

            let history = alerts.history(&query).await?;
            println!("Alert history ({} total)", history.total);
            for entry in history.items {
                let marker = match entry.status {
                    HistoryStatus::Triggered => "✗",
                    HistoryStatus::Recovered => "✓",
                };
                println!(
                    "  {} {} [{}] {}: {}",
                    marker,
                    entry.created_at,
                    entry.level.as_str(),
                    entry.rule_name,
                    entry.message
                );
            }
        }
        AlertCommands::Engine => {
            let status = alerts.engine_status().await?;
            if status.running {
                println!("✓ Evaluation engine is running");
                if let Some(uptime) = status.uptime {
                    println!("  Uptime: {:.0}s", uptime);
                }
            } else {
                println!("✗ Evaluation engine is stopped");
            }
            if let Some(last_check) = status.last_check {
                println!("  Last check: {}", last_check);
            }
        }
    }
    Ok(())
}

async fn handle_ldap_command(cmd: LdapCommands, gateway: &ApiGateway) -> anyhow::Result<()> {
    let ldap = LdapService::new(gateway.clone());

    match cmd {
        LdapCommands::Users { env } => {
            let users = ldap.users(&env).await?;
            println!("Directory users in '{}' ({})", env, users.len());
            for user in users {
                match user.email {
                    Some(email) => println!("  {} <{}>", user.username, email),
                    None => println!("  {}", user.username),
                }
            }
        }
        LdapCommands::Groups { env } => {
            let groups = ldap.groups(&env).await?;
            println!("Directory groups in '{}' ({})", env, groups.len());
            for group in groups {
                println!(
                    "  {} ({} members)",
                    group.groupname,
                    group.members.len()
                );
            }
        }
    }
    Ok(())
}

async fn handle_cluster_command(cmd: ClusterCommands, gateway: &ApiGateway) -> anyhow::Result<()> {
    let cluster = ClusterService::new(gateway.clone());

    match cmd {
        ClusterCommands::Overview => {
            let overview = cluster.overview().await?;
            println!("Cluster overview (updated {})", overview.update_time);
            println!(
                "  Nodes: {} total | {} healthy | {} unhealthy",
                overview.total_nodes, overview.healthy_nodes, overview.unhealthy_nodes
            );
            println!(
                "  Averages: cpu {:.1}% | memory {:.1}% | disk {:.1}%",
                overview.avg_cpu_usage, overview.avg_memory_usage, overview.avg_disk_usage
            );

            if !overview.services_status.is_empty() {
                println!("  Services:");
                let mut services: Vec<_> = overview.services_status.iter().collect();
                services.sort_by(|a, b| a.0.cmp(b.0));
                for (name, status) in services {
                    let icon = if status.healthy == status.total { "✓" } else { "✗" };
                    println!("    {} {}: {}/{} healthy", icon, name, status.healthy, status.total);
                }
            }
        }
        ClusterCommands::Nodes { status } => {
            let query = NodesQuery {
                status,
                ..Default::default()
            };

            let nodes = cluster.nodes(&query).await?;
            println!("Cluster nodes ({} total)", nodes.total);
            for node in nodes.items {
                let icon = if node.status == "up" { "✓" } else { "✗" };
                println!(
                    "  {} {} cpu {:.1}% | mem {:.1}% | disk {:.1}% | load {:.2} | up {}",
                    icon,
                    node.hostname,
                    node.cpu_usage,
                    node.memory_usage,
                    node.disk_usage,
                    node.load_1m,
                    node.uptime_formatted
                );
            }
        }
    }
    Ok(())
}

fn parse_severity(value: &str) -> anyhow::Result<Severity> {
    match value {
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => anyhow::bail!(
            "unknown severity '{}' (expected low, medium, high, or critical)",
            other
        ),
    }
}
