use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// Sectors to seed into the registry at startup.
    #[serde(default)]
    pub sectors: Vec<SectorSeed>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ventanilla.db")
}

/// Queue behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Attempts before a contended claim or redirect is given up.
    #[serde(default = "default_claim_retries")]
    pub claim_retries: u32,
    /// Buffered events per notification subscriber.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Buffered events in the audit channel.
    #[serde(default = "default_audit_buffer")]
    pub audit_buffer: usize,
    /// Office timezone as minutes east of UTC. Ticket counters reset at
    /// this local midnight.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            claim_retries: default_claim_retries(),
            event_buffer: default_event_buffer(),
            audit_buffer: default_audit_buffer(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_claim_retries() -> u32 {
    3
}

fn default_event_buffer() -> usize {
    32
}

fn default_audit_buffer() -> usize {
    256
}

/// A sector declared in the configuration file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectorSeed {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub max_capacity: Option<u32>,
}

fn default_active() -> bool {
    true
}
