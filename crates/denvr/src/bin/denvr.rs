//! Denvr CLI - manage Denvr Dataworks virtual servers and applications.

use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use denvr::api::servers::applications::{
    ApplicationClient, ApplicationDetails, ApplicationRef, GET_APPLICATION_DETAILS,
    START_APPLICATION, STOP_APPLICATION,
};
use denvr::api::servers::virtual_servers::{
    CreateServerRequest, ServerRef, VirtualServerClient, VirtualServerDetails, CREATE_SERVER,
    GET_SERVER, START_SERVER, STOP_SERVER,
};
use denvr::api::servers::ServerStatus;
use denvr::waiter::{CheckRegistry, Waitable, Waiter, WaiterOptions};
use denvr::Session;

/// Denvr CLI - Manage GPU virtual servers and applications.
#[derive(Parser)]
#[command(name = "denvr")]
#[command(about = "Manage Denvr Dataworks virtual servers and applications")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/denvr.toml).
    #[arg(long, short, env = "DENVR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Virtual server operations.
    Servers {
        #[command(subcommand)]
        command: ServerCommands,
    },

    /// Application operations.
    Applications {
        #[command(subcommand)]
        command: ApplicationCommands,
    },
}

/// Options for blocking until an operation has taken effect.
#[derive(Args, Debug, Clone, Copy)]
struct WaitArgs {
    /// Wait until the resource reaches its target status.
    #[arg(long, default_value = "false")]
    wait: bool,

    /// Give up waiting after this many seconds.
    #[arg(long, default_value = "600")]
    timeout: u64,

    /// Seconds between status checks.
    #[arg(long, default_value = "10")]
    interval: u64,
}

impl WaitArgs {
    fn options(self) -> WaiterOptions {
        WaiterOptions::new(
            Duration::from_secs(self.timeout),
            Duration::from_secs(self.interval),
        )
    }
}

/// Identifies a server; namespace and cluster default to the config.
#[derive(Args, Debug, Clone)]
struct ServerTarget {
    /// Server name.
    #[arg(long)]
    id: String,

    /// Tenant namespace (defaults to the configured tenant).
    #[arg(long)]
    namespace: Option<String>,

    /// Cluster (defaults to the configured cluster).
    #[arg(long)]
    cluster: Option<String>,
}

/// Identifies an application; cluster defaults to the config.
#[derive(Args, Debug, Clone)]
struct ApplicationTarget {
    /// Application name.
    #[arg(long)]
    id: String,

    /// Cluster (defaults to the configured cluster).
    #[arg(long)]
    cluster: Option<String>,
}

#[derive(Subcommand)]
enum ServerCommands {
    /// List virtual servers.
    List {
        /// Only list servers in this cluster.
        #[arg(long)]
        cluster: Option<String>,
    },

    /// Show one virtual server.
    Get(ServerTarget),

    /// Create a virtual server.
    Create {
        /// Server name.
        #[arg(long)]
        name: String,

        /// Hardware configuration (from `servers configurations`).
        #[arg(long)]
        configuration: String,

        /// Cluster (defaults to the configured cluster).
        #[arg(long)]
        cluster: Option<String>,

        /// Resource pool (defaults to the configured pool).
        #[arg(long)]
        rpool: Option<String>,

        /// VPC (defaults to the configured VPC).
        #[arg(long)]
        vpc: Option<String>,

        /// Operating system image.
        #[arg(long)]
        image: Option<String>,

        /// SSH public keys (comma-separated).
        #[arg(long, value_delimiter = ',')]
        ssh_keys: Vec<String>,

        /// Root disk size in GB.
        #[arg(long)]
        root_disk_size: Option<u64>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Start a stopped virtual server.
    Start {
        #[command(flatten)]
        target: ServerTarget,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Stop a running virtual server.
    Stop {
        #[command(flatten)]
        target: ServerTarget,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Destroy a virtual server.
    Destroy {
        #[command(flatten)]
        target: ServerTarget,

        /// Also delete the server's snapshots.
        #[arg(long, default_value = "false")]
        delete_snapshots: bool,

        /// Skip confirmation prompt.
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },

    /// List hardware configurations.
    Configurations,

    /// Show capacity per configuration.
    Availability {
        /// Cluster (defaults to the configured cluster).
        #[arg(long)]
        cluster: Option<String>,

        /// Resource pool (defaults to the configured pool).
        #[arg(long)]
        rpool: Option<String>,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// List applications.
    List,

    /// Show one application.
    Get(ApplicationTarget),

    /// Start a stopped application.
    Start {
        #[command(flatten)]
        target: ApplicationTarget,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Stop a running application.
    Stop {
        #[command(flatten)]
        target: ApplicationTarget,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Destroy an application.
    Destroy {
        #[command(flatten)]
        target: ApplicationTarget,

        /// Skip confirmation prompt.
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },

    /// List hardware packages.
    Configurations,

    /// Show capacity per hardware package.
    Availability {
        /// Cluster (defaults to the configured cluster).
        #[arg(long)]
        cluster: Option<String>,

        /// Resource pool (defaults to the configured pool).
        #[arg(long)]
        rpool: Option<String>,
    },

    /// List catalog applications.
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = Session::from_path(cli.config.as_deref()).context("Failed to load Denvr config")?;

    match cli.command {
        Commands::Servers { command } => run_servers(VirtualServerClient::new(session), command).await,
        Commands::Applications { command } => {
            run_applications(ApplicationClient::new(session), command).await
        }
    }
}

async fn run_servers(client: VirtualServerClient, command: ServerCommands) -> Result<()> {
    let config = client.session().config().clone();
    let server_ref = |target: ServerTarget| {
        ServerRef::new(
            target.id,
            target.namespace.unwrap_or_else(|| config.tenant.clone()),
            target.cluster.unwrap_or_else(|| config.cluster.clone()),
        )
    };

    match command {
        ServerCommands::List { cluster } => {
            let servers = client.get_servers(cluster.as_deref()).await?;

            println!(
                "\n{:<30} {:<12} {:<8} {:<28} {:<16}",
                "ID", "NAMESPACE", "CLUSTER", "STATUS", "IP"
            );
            println!("{}", "-".repeat(96));

            for server in servers {
                println!(
                    "{:<30} {:<12} {:<8} {} {:<25} {:<16}",
                    server.id.as_deref().unwrap_or("-"),
                    server.namespace.as_deref().unwrap_or("-"),
                    server.cluster.as_deref().unwrap_or("-"),
                    status_emoji(server.status.as_ref()),
                    status_label(server.status.as_ref()),
                    server.public_ip.as_deref().or(server.private_ip.as_deref()).unwrap_or("-"),
                );
            }
            println!();
        }

        ServerCommands::Get(target) => {
            let server = client.get_server(&server_ref(target)).await?;
            print_server(&server);
        }

        ServerCommands::Create {
            name,
            configuration,
            cluster,
            rpool,
            vpc,
            image,
            ssh_keys,
            root_disk_size,
            wait,
        } => {
            let request = CreateServerRequest {
                cluster,
                rpool,
                vpc,
                operating_system_image: image,
                ssh_keys,
                root_disk_size,
                ..CreateServerRequest::new(name, configuration)
            };

            let mut server = client.create_server(&request).await?;
            if wait.wait {
                let created = server
                    .server_ref()
                    .context("Create response did not identify the new server")?;
                server = wait_for(&client, CREATE_SERVER, GET_SERVER, created.into(), wait).await?;
            }

            println!("\n✅ Virtual server created!");
            print_server(&server);
            if !wait.wait {
                println!("\n💡 Run `denvr servers start --wait ...` or `denvr servers get` to follow progress");
            }
        }

        ServerCommands::Start { target, wait } => {
            let server_ref = server_ref(target);
            let mut server = client.start_server(&server_ref).await?;
            if wait.wait {
                server = wait_for(&client, START_SERVER, GET_SERVER, server_ref.into(), wait).await?;
            }
            println!("\n✅ Start requested");
            print_server(&server);
        }

        ServerCommands::Stop { target, wait } => {
            let server_ref = server_ref(target);
            let mut server = client.stop_server(&server_ref).await?;
            if wait.wait {
                server = wait_for(&client, STOP_SERVER, GET_SERVER, server_ref.into(), wait).await?;
            }
            println!("\n✅ Stop requested");
            print_server(&server);
        }

        ServerCommands::Destroy {
            target,
            delete_snapshots,
            yes,
        } => {
            let server_ref = server_ref(target);
            if !yes {
                println!("⚠️  Are you sure you want to destroy virtual server {}?", server_ref.id);
                println!("   This action cannot be undone.");
                println!("   Use --yes to skip this prompt.");
                return Ok(());
            }

            client.destroy_server(&server_ref, delete_snapshots).await?;
            println!("\n✅ Virtual server {} destroyed", server_ref.id);
        }

        ServerCommands::Configurations => {
            let configurations = client.get_configurations().await?;

            println!("\n🎮 Virtual Server Configurations");
            println!("{}", "=".repeat(90));

            for c in configurations {
                println!(
                    "\n{} ({})",
                    c.user_friendly_name.or(c.name).unwrap_or_default(),
                    c.gpu_name.unwrap_or_default()
                );
                println!(
                    "   GPUs: {} | vCPUs: {} | RAM: {} GB | Storage: {} GB",
                    c.gpus.unwrap_or(0),
                    c.vcpus.unwrap_or(0),
                    c.memory.unwrap_or(0),
                    c.storage.unwrap_or(0)
                );
                println!("   💰 ${:.2}/hr", c.price.unwrap_or(0.0));
                println!("   📍 Clusters: {}", join_or_none(&c.clusters));
            }
            println!();
        }

        ServerCommands::Availability { cluster, rpool } => {
            let cluster = cluster.unwrap_or_else(|| config.cluster.clone());
            let rpool = rpool.unwrap_or_else(|| config.rpool.clone());
            let availability = client.get_availability(&cluster, &rpool).await?;

            println!("\n📦 Availability in {cluster} ({rpool})");
            for a in availability {
                println!(
                    "   {} {:<40} {}",
                    if a.available.unwrap_or(false) { "🟢" } else { "🔴" },
                    a.configuration.unwrap_or_default(),
                    a.count.map(|c| c.to_string()).unwrap_or_default()
                );
            }
            println!();
        }
    }

    Ok(())
}

async fn run_applications(client: ApplicationClient, command: ApplicationCommands) -> Result<()> {
    let config = client.session().config().clone();
    let application_ref = |target: ApplicationTarget| {
        ApplicationRef::new(
            target.id,
            target.cluster.unwrap_or_else(|| config.cluster.clone()),
        )
    };

    match command {
        ApplicationCommands::List => {
            let applications = client.get_applications().await?;

            println!("\n{:<30} {:<8} {:<28} {:<30}", "ID", "CLUSTER", "STATUS", "APPLICATION");
            println!("{}", "-".repeat(96));

            for app in applications {
                println!(
                    "{:<30} {:<8} {} {:<25} {:<30}",
                    app.id.as_deref().unwrap_or("-"),
                    app.cluster.as_deref().unwrap_or("-"),
                    status_emoji(app.status.as_ref()),
                    status_label(app.status.as_ref()),
                    app.application_catalog_item_name
                        .as_deref()
                        .or(app.image_url.as_deref())
                        .unwrap_or("-"),
                );
            }
            println!();
        }

        ApplicationCommands::Get(target) => {
            let details = client.get_application_details(&application_ref(target)).await?;
            print_application(&details);
        }

        ApplicationCommands::Start { target, wait } => {
            let application = application_ref(target);
            let mut details = client.start_application(&application).await?;
            if wait.wait {
                details = wait_for(
                    &client,
                    START_APPLICATION,
                    GET_APPLICATION_DETAILS,
                    application.into(),
                    wait,
                )
                .await?;
            }
            println!("\n✅ Start requested");
            print_application(&details);
        }

        ApplicationCommands::Stop { target, wait } => {
            let application = application_ref(target);
            let mut details = client.stop_application(&application).await?;
            if wait.wait {
                details = wait_for(
                    &client,
                    STOP_APPLICATION,
                    GET_APPLICATION_DETAILS,
                    application.into(),
                    wait,
                )
                .await?;
            }
            println!("\n✅ Stop requested");
            print_application(&details);
        }

        ApplicationCommands::Destroy { target, yes } => {
            let application = application_ref(target);
            if !yes {
                println!("⚠️  Are you sure you want to destroy application {}?", application.id);
                println!("   This action cannot be undone.");
                println!("   Use --yes to skip this prompt.");
                return Ok(());
            }

            client.destroy_application(&application).await?;
            println!("\n✅ Application {} destroyed", application.id);
        }

        ApplicationCommands::Configurations => {
            let configurations = client.get_configurations().await?;

            println!("\n🎮 Application Hardware Packages");
            println!("{}", "=".repeat(90));

            for c in configurations {
                println!("\n{}", c.name.unwrap_or_default());
                if let Some(description) = c.description {
                    println!("   {description}");
                }
                println!(
                    "   GPUs: {} x {} | vCPUs: {} | RAM: {} GB | Disk: {} GB",
                    c.gpu_count.unwrap_or(0),
                    c.gpu_name.unwrap_or_default(),
                    c.vcpus_count.unwrap_or(0),
                    c.memory_gb.unwrap_or(0),
                    c.direct_attached_storage_gb.unwrap_or(0)
                );
                println!("   💰 ${:.2}/hr", c.price_per_hour.unwrap_or(0.0));
                println!("   📍 Clusters: {}", join_or_none(&c.clusters));
            }
            println!();
        }

        ApplicationCommands::Availability { cluster, rpool } => {
            let cluster = cluster.unwrap_or_else(|| config.cluster.clone());
            let rpool = rpool.unwrap_or_else(|| config.rpool.clone());
            let availability = client.get_availability(&cluster, &rpool).await?;

            println!("\n📦 Availability in {cluster} ({rpool})");
            for a in availability {
                println!(
                    "   {} {:<40} {}",
                    if a.available.unwrap_or(false) { "🟢" } else { "🔴" },
                    a.configuration.unwrap_or_default(),
                    a.count.map(|c| c.to_string()).unwrap_or_default()
                );
            }
            println!();
        }

        ApplicationCommands::Catalog => {
            let items = client.get_application_catalog_items().await?;

            println!("\n📚 Application Catalog");
            for item in items {
                let versions: Vec<String> = item.versions.into_iter().filter_map(|v| v.name).collect();
                println!("\n{}", item.name.unwrap_or_default());
                if let Some(description) = item.description {
                    println!("   {description}");
                }
                println!("   Versions: {}", join_or_none(&versions));
            }
            println!();
        }
    }

    Ok(())
}

/// Poll `read` until the check registered for the already-sent `action`
/// passes, cancelling on Ctrl-C.
async fn wait_for<C>(
    client: &C,
    action: &'static str,
    read: &'static str,
    args: C::Args,
    wait: WaitArgs,
) -> Result<C::Output>
where
    C: Waitable,
    C::Output: Debug,
{
    let waiter = Waiter::polling(CheckRegistry::global(), client, action, read, wait.options())
        .with_context(|| format!("Cannot wait on {action}"))?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling wait");
                cancel.cancel();
            }
        })
    };

    println!(
        "⏳ Waiting on {action} (timeout {}s, checking every {}s)...",
        wait.timeout, wait.interval
    );
    info!(action, read, timeout = wait.timeout, interval = wait.interval, "Waiting");
    let result = waiter.wait(&cancel, args).await;
    ctrl_c.abort();

    result.with_context(|| format!("Waiting on {action} failed"))
}

fn status_emoji(status: Option<&ServerStatus>) -> &'static str {
    match status {
        Some(ServerStatus::Online) => "🟢",
        Some(
            ServerStatus::Pending
            | ServerStatus::Provisioning
            | ServerStatus::Starting
            | ServerStatus::Stopping
            | ServerStatus::Deleting,
        ) => "🟡",
        Some(ServerStatus::Offline | ServerStatus::Error) => "🔴",
        _ => "⚪",
    }
}

fn status_label(status: Option<&ServerStatus>) -> &'static str {
    status.map_or("UNKNOWN", ServerStatus::as_str)
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(", ")
    }
}

fn print_server(server: &VirtualServerDetails) {
    println!("\n🖥️  Virtual server: {}", server.id.as_deref().unwrap_or("-"));
    println!(
        "   Status:        {} {}",
        status_emoji(server.status.as_ref()),
        status_label(server.status.as_ref())
    );
    println!("   Namespace:     {}", server.namespace.as_deref().unwrap_or("-"));
    println!("   Cluster:       {}", server.cluster.as_deref().unwrap_or("-"));
    println!("   Configuration: {}", server.configuration.as_deref().unwrap_or("-"));
    if let (Some(gpus), Some(gpu_type)) = (server.gpus, server.gpu_type.as_deref()) {
        println!("   GPU:           {gpu_type} x{gpus}");
    }
    if let Some(ip) = server.public_ip.as_deref().or(server.private_ip.as_deref()) {
        println!("\n   📡 SSH: {}@{}", server.username.as_deref().unwrap_or("ubuntu"), ip);
    }
}

fn print_application(details: &ApplicationDetails) {
    let Some(instance) = details.instance_details.as_ref() else {
        println!("\n⚪ Application details unavailable");
        return;
    };

    println!("\n📦 Application: {}", instance.id.as_deref().unwrap_or("-"));
    println!(
        "   Status:   {} {}",
        status_emoji(instance.status.as_ref()),
        status_label(instance.status.as_ref())
    );
    println!("   Cluster:  {}", instance.cluster.as_deref().unwrap_or("-"));
    if let Some(package) = instance.hardware_package_name.as_deref() {
        println!("   Hardware: {package}");
    }
    if let Some(dns) = instance.dns.as_deref() {
        println!("\n   🌐 https://{dns}");
    }
}
