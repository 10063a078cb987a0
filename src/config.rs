use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATA_FILES: [&str; 3] = [
    "accidents_2005_to_2007.csv",
    "accidents_2009_to_2011.csv",
    "accidents_2012_to_2014.csv",
];

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8050";

/// Runtime settings for the dashboard.
///
/// Read from the environment (a `.env` file is loaded first by the binary):
/// `ACCIDENTS_DATA_FILES` (comma separated), `ACCIDENTS_MAP_DIR` and
/// `ACCIDENTS_BIND_ADDR`. CLI flags override individual values.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_files: Vec<PathBuf>,
    pub map_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_files = lookup("ACCIDENTS_DATA_FILES")
            .map(|v| split_list(&v))
            .filter(|files| !files.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_FILES.iter().map(PathBuf::from).collect());

        let map_dir = lookup("ACCIDENTS_MAP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let bind = lookup("ACCIDENTS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("invalid ACCIDENTS_BIND_ADDR '{bind}'"))?;

        Ok(Self {
            data_files,
            map_dir,
            bind_addr,
        })
    }

    /// Applies CLI overrides; empty or absent values keep the current setting.
    pub fn with_overrides(
        mut self,
        data_files: Vec<PathBuf>,
        map_dir: Option<PathBuf>,
        bind_addr: Option<SocketAddr>,
    ) -> Self {
        if !data_files.is_empty() {
            self.data_files = data_files;
        }
        if let Some(dir) = map_dir {
            self.map_dir = dir;
        }
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        self
    }
}

fn split_list(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
