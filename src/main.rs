//! Edge DNS Compiler
//!
//! Resolves zones and compiles the records and transforms documents into a
//! descriptor plan for the provisioning engine.
//!
//! # Usage
//! ```bash
//! # Print the compiled plan as JSON
//! edge-dns --config infra/dns.yml plan
//!
//! # Validate against the static zones in the config, no network
//! edge-dns --config infra/dns.yml plan --offline --format summary
//!
//! # Show how each configured domain resolved
//! edge-dns --config infra/dns.yml zones
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use edge_dns::zones::ZoneStatus;
use edge_dns::{credentials, telemetry, CloudflareClient, Config, Plan, StaticZones, ZoneLookup, ZoneResolver};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "edge-dns")]
#[command(about = "Compile DNS records and header transforms into Cloudflare resources", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "EDGE_DNS_CONFIG", default_value = "edge-dns.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the plan and print it
    Plan {
        /// Use the config's static zones instead of the Cloudflare API
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Resolve configured domains and print their zone IDs
    Zones {
        /// Use the config's static zones instead of the Cloudflare API
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Summary,
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    telemetry::init(&config.telemetry, cli.verbose)?;

    info!(
        config_file = %cli.config.display(),
        domains = config.domains.len(),
        servers = config.servers.len(),
        "Starting edge-dns"
    );

    match cli.command {
        Commands::Plan { offline, format } => {
            let lookup = zone_lookup(&config, offline).await?;
            let plan = Plan::build(&config, lookup.as_ref()).await?;

            match format {
                Format::Json => {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                }
                Format::Summary => print_summary(&plan),
            }
        }

        Commands::Zones { offline } => {
            let lookup = zone_lookup(&config, offline).await?;
            let zones = ZoneResolver::new(lookup.as_ref())
                .resolve(&config.domains)
                .await;

            println!("\n{:<32} {:<40}", "DOMAIN", "ZONE");
            println!("{}", "-".repeat(72));
            for (domain, status) in zones.iter() {
                match status {
                    ZoneStatus::Resolved(id) => println!("{:<32} {:<40}", domain, id),
                    ZoneStatus::Unresolved(reason) => {
                        println!("{:<32} unresolved: {}", domain, truncate(reason, 60))
                    }
                }
            }

            let failed = zones.unresolved().count();
            if failed > 0 {
                warn!(failed, "Some zones could not be resolved");
            }
        }
    }

    Ok(())
}

async fn zone_lookup(config: &Config, offline: bool) -> Result<Box<dyn ZoneLookup>> {
    if offline {
        info!(zones = config.zones.len(), "Using static zones");
        return Ok(Box::new(StaticZones::new(config.zones.clone())));
    }

    let api_token = credentials::api_token(&config.cloudflare).await?;
    let client = CloudflareClient::new(
        api_token,
        config.cloudflare.api_base.clone(),
        config.cloudflare.timeout(),
    )
    .context("Failed to initialize Cloudflare client")?;

    Ok(Box::new(client))
}

fn print_summary(plan: &Plan) {
    println!("\n{:<8} {:<40} {:<40}", "TYPE", "NAME", "VALUE");
    println!("{}", "-".repeat(90));

    for record in &plan.dns_records {
        let proxied = if record.proxied == Some(true) { " (proxied)" } else { "" };
        println!(
            "{:<8} {:<40} {}{}",
            record.record_type,
            truncate(&record.name, 40),
            truncate(&record.value, 40),
            proxied
        );
    }
    for redirect in &plan.redirects {
        println!(
            "{:<8} {:<40} {} -> {}",
            "REDIR",
            truncate(&redirect.target, 40),
            redirect.status_code,
            redirect.destination_url
        );
    }
    for ruleset in &plan.rulesets {
        println!(
            "{:<8} {:<40} {} rules",
            "RULESET",
            ruleset.id,
            ruleset.rules.len()
        );
    }

    println!(
        "\n{} DNS records, {} redirects, {} rulesets",
        plan.dns_records.len(),
        plan.redirects.len(),
        plan.rulesets.len()
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
