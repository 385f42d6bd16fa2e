//! CLI Tooling
//!
//! Command-line interface for record operations. Every command maps onto one
//! resource hook; `apply` converges a whole manifest.

use crate::config::ProviderConfig;
use crate::error::RecordError;
use crate::record::{derive_path, RecordReconciler};
use crate::resource::{self, RecordManifest, ResourceAction};
use crate::store::{self, EtcdKeysClient, KeyValueStore};
use crate::types::LogicalRecord;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// skydns-records - manage SkyDNS records stored in etcd
#[derive(Parser)]
#[command(name = "skydns-records")]
#[command(about = "Manage SkyDNS records stored in etcd")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// etcd endpoint URL; repeat for several (replaces configured endpoints)
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,

    /// SkyDNS key prefix (default: /skydns/)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line flags over loaded configuration.
    pub fn apply_overrides(&self, config: &mut ProviderConfig) {
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.skydns_prefix = prefix.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the store path a record name maps to
    Path {
        name: String,
    },
    /// Create or replace a record; no --host removes it
    Create {
        #[arg(long)]
        name: String,
        /// Seconds; required with --host, ignored when removing
        #[arg(long)]
        ttl: Option<u32>,
        /// Target address or hostname; repeat for several
        #[arg(long = "host")]
        hosts: Vec<String>,
    },
    /// Show a record
    Read {
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove a record and its directory
    Delete {
        name: String,
    },
    /// Print whether a record exists
    Exists {
        name: String,
    },
    /// Converge the store to a manifest of records
    Apply {
        /// TOML, YAML or JSON file with a `records` array
        #[arg(long)]
        file: PathBuf,
        /// Print the plan without changing the store
        #[arg(long)]
        dry_run: bool,
    },
}

impl Commands {
    /// Whether the command talks to the store.
    pub fn requires_store(&self) -> bool {
        !matches!(self, Commands::Path { .. })
    }
}

/// Path for `name` under `prefix`, as printed by `path`.
pub fn render_path(name: &str, prefix: &str) -> Result<String, RecordError> {
    crate::record::validate_name(name)?;
    Ok(derive_path(name, prefix).to_string())
}

/// CLI execution context bound to one store handle.
pub struct CliContext<S> {
    reconciler: RecordReconciler<S>,
}

impl CliContext<EtcdKeysClient> {
    /// Open an etcd handle from configuration.
    pub fn connect(config: &ProviderConfig) -> Result<Self, RecordError> {
        config.validate()?;
        let client = store::connect(&config.store_config())?;
        Ok(Self::with_store(client, &config.prefix()))
    }
}

impl<S: KeyValueStore> CliContext<S> {
    pub fn with_store(store: S, prefix: &str) -> Self {
        Self {
            reconciler: RecordReconciler::new(store, prefix),
        }
    }

    pub fn reconciler(&self) -> &RecordReconciler<S> {
        &self.reconciler
    }

    /// Execute a command and return what should be printed.
    pub async fn execute(&self, command: &Commands) -> Result<String, RecordError> {
        match command {
            Commands::Path { name } => render_path(name, self.reconciler.prefix()),
            Commands::Create { name, ttl, hosts } => {
                let hosts: BTreeSet<String> = hosts.iter().cloned().collect();
                let ttl = match ttl {
                    Some(ttl) => *ttl,
                    None if hosts.is_empty() => 0,
                    None => {
                        return Err(RecordError::InvalidRecord(format!(
                            "--ttl is required when writing hosts for {}",
                            name
                        )))
                    }
                };
                let id = self.reconciler.create_or_replace(name, ttl, &hosts).await?;
                if hosts.is_empty() {
                    Ok(format!("Removed {}", id))
                } else {
                    Ok(format!(
                        "Wrote {} ({} host{}) at {}",
                        id,
                        hosts.len(),
                        if hosts.len() == 1 { "" } else { "s" },
                        self.reconciler.path_for(name)
                    ))
                }
            }
            Commands::Read { name, format } => {
                let record = self.reconciler.read(name).await?;
                self.format_record(&record, format)
            }
            Commands::Delete { name } => {
                self.reconciler.delete(name).await?;
                Ok(format!("Deleted {}", name))
            }
            Commands::Exists { name } => Ok(self.reconciler.exists(name).await?.to_string()),
            Commands::Apply { file, dry_run } => self.apply_manifest(file, *dry_run).await,
        }
    }

    fn format_record(&self, record: &LogicalRecord, format: &str) -> Result<String, RecordError> {
        let path = self.reconciler.path_for(&record.name);
        match format {
            "json" => {
                let value = json!({
                    "name": record.name,
                    "ttl": record.ttl,
                    "hosts": record.hosts,
                    "path": path.as_str(),
                });
                serde_json::to_string_pretty(&value)
                    .map_err(|e| RecordError::Config(format!("Failed to render JSON: {}", e)))
            }
            "text" => {
                let ttl = record
                    .ttl
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let mut table = Table::new();
                table.load_preset(comfy_table::presets::UTF8_FULL);
                table.set_header(vec!["Name", "TTL", "Host"]);
                for host in &record.hosts {
                    table.add_row(vec![record.name.as_str(), ttl.as_str(), host.as_str()]);
                }
                Ok(format!("{}\n{}", path, table))
            }
            other => Err(RecordError::Config(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    async fn apply_manifest(&self, file: &Path, dry_run: bool) -> Result<String, RecordError> {
        let manifest = RecordManifest::load(file)?;
        let mut lines = Vec::with_capacity(manifest.records.len());

        for desired in &manifest.records {
            let current = resource::observe(&self.reconciler, &desired.name).await?;
            let action = if dry_run {
                resource::plan(current.as_ref(), Some(desired))
            } else {
                resource::apply(&self.reconciler, current.as_ref(), Some(desired)).await?
            };
            let line = match &action {
                ResourceAction::Replace { changed } => format!(
                    "{:<8} {} (changed: {})",
                    action.label(),
                    desired.name,
                    changed.join(", ")
                ),
                _ => format!("{:<8} {}", action.label(), desired.name),
            };
            lines.push(line);
        }

        if dry_run {
            lines.push("(dry run, store unchanged)".to_string());
        }
        Ok(lines.join("\n"))
    }
}
