//! Node configuration: TOML file plus command-line overrides.
//!
//! ```toml
//! node_id = "node-a"
//! listen = "0.0.0.0:8080"
//! log_format = "text"
//!
//! [notify]
//! timeout = "5s"
//! workers = 8
//! queue_capacity = 1024
//!
//! [[peers]]
//! id = "node-b"
//! url = "http://10.0.0.2:8080"
//!
//! [[trains]]
//! id = "6f1c0b8e-2d4a-4c1e-9d53-0b7f2a9e1c44"
//! name = "Coastal Express"
//! total_seats = 120
//! ```
//!
//! Every node must list the same trains.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use rsvgrid_api::Train;
use rsvgrid_coord::{DirectoryError, Peer, PeerDirectory};
use rsvgrid_notify::NotifierConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid peer list: {0}")]
    Peers(#[from] DirectoryError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub node_id: String,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
    #[serde(default)]
    pub trains: Vec<Train>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifySection {
    /// Per-call timeout, e.g. "5s" or "500ms".
    pub timeout: String,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            timeout: "5s".to_string(),
            workers: 8,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerEntry {
    pub id: String,
    pub url: String,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub node_id: Option<String>,
    pub listen: Option<SocketAddr>,
    /// Added to the file's peers; an entry with an existing id replaces it.
    pub peers: Vec<PeerEntry>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(node_id) = overrides.node_id {
            self.node_id = node_id;
        }
        if let Some(listen) = overrides.listen {
            self.listen = listen;
        }
        for entry in overrides.peers {
            match self.peers.iter_mut().find(|p| p.id == entry.id) {
                Some(existing) => *existing = entry,
                None => self.peers.push(entry),
            }
        }
    }

    /// Check everything `rsvd serve` would reject at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.peer_directory()?;
        self.notifier_config()?;
        self.check_trains()
    }

    fn check_trains(&self) -> Result<(), ConfigError> {
        for (i, train) in self.trains.iter().enumerate() {
            if train.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("train {} has no name", train.id)));
            }
            if train.total_seats == 0 {
                return Err(ConfigError::Invalid(format!(
                    "train {} must have at least one seat",
                    train.id
                )));
            }
            if self.trains[..i].iter().any(|t| t.id == train.id) {
                return Err(ConfigError::Invalid(format!(
                    "train {} is configured more than once",
                    train.id
                )));
            }
        }
        Ok(())
    }

    pub fn peer_directory(&self) -> Result<PeerDirectory, ConfigError> {
        let peers = self
            .peers
            .iter()
            .map(|p| Peer::new(p.id.clone(), p.url.clone()))
            .collect();
        Ok(PeerDirectory::new(self.node_id.clone(), peers)?)
    }

    pub fn notifier_config(&self) -> Result<NotifierConfig, ConfigError> {
        let notify = &self.notify;
        let timeout = parse_duration(&notify.timeout)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                ConfigError::Invalid(format!("notify.timeout: cannot parse {:?}", notify.timeout))
            })?;
        if notify.workers == 0 {
            return Err(ConfigError::Invalid("notify.workers must be at least 1".into()));
        }
        if notify.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notify.queue_capacity must be at least 1".into(),
            ));
        }
        Ok(NotifierConfig {
            timeout,
            workers: notify.workers,
            queue_capacity: notify.queue_capacity,
        })
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
///
/// Returns `None` for unknown units and for values that overflow.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, millis_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s, 1_000)
    };
    let value = digits.trim().parse::<u64>().ok()?;
    value.checked_mul(millis_per_unit).map(Duration::from_millis)
}

/// Parse a `--peer id=url` argument.
pub fn parse_peer_arg(s: &str) -> Result<PeerEntry, String> {
    let (id, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=URL, got {s:?}"))?;
    if id.is_empty() || url.is_empty() {
        return Err(format!("expected ID=URL, got {s:?}"));
    }
    Ok(PeerEntry {
        id: id.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const FULL: &str = r#"
node_id = "node-a"
listen = "127.0.0.1:9001"
log_format = "json"

[notify]
timeout = "750ms"
workers = 4
queue_capacity = 64

[[peers]]
id = "node-b"
url = "http://127.0.0.1:9002/"

[[peers]]
id = "node-c"
url = "http://127.0.0.1:9003"

[[trains]]
id = "00000000-0000-0000-0000-00000000000e"
name = "express"
total_seats = 100
"#;

    #[test]
    fn parses_full_config() {
        let file = write_config(FULL);
        let config = NodeConfig::from_file(file.path()).unwrap();

        assert_eq!(config.node_id, "node-a");
        assert_eq!(config.listen, "127.0.0.1:9001".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);

        let notify = config.notifier_config().unwrap();
        assert_eq!(notify.timeout, Duration::from_millis(750));
        assert_eq!(notify.workers, 4);
        assert_eq!(notify.queue_capacity, 64);

        let dir = config.peer_directory().unwrap();
        assert_eq!(dir.self_id(), "node-a");
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get("node-b").unwrap().url, "http://127.0.0.1:9002");

        assert_eq!(config.trains.len(), 1);
        assert_eq!(config.trains[0].name, "express");
        assert_eq!(config.trains[0].total_seats, 100);
        assert_eq!(
            config.trains[0].id.to_string(),
            "00000000-0000-0000-0000-00000000000e"
        );
    }

    #[test]
    fn rejects_bad_trains() {
        let base = FULL.to_string();

        let dup = format!(
            "{base}\n[[trains]]\nid = \"00000000-0000-0000-0000-00000000000e\"\nname = \"again\"\ntotal_seats = 5\n"
        );
        let config = NodeConfig::from_file(write_config(&dup).path()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("more than once")));

        let empty = format!(
            "{base}\n[[trains]]\nid = \"00000000-0000-0000-0000-000000000001\"\nname = \"tiny\"\ntotal_seats = 0\n"
        );
        let config = NodeConfig::from_file(write_config(&empty).path()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("at least one seat")));

        let bad_id = format!("{base}\n[[trains]]\nid = \"train-1\"\nname = \"x\"\ntotal_seats = 5\n");
        let err = NodeConfig::from_file(write_config(&bad_id).path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let file = write_config(r#"node_id = "solo""#);
        let config = NodeConfig::from_file(file.path()).unwrap();

        assert_eq!(config.listen, default_listen());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.peers.is_empty());

        let notify = config.notifier_config().unwrap();
        assert_eq!(notify.timeout, Duration::from_secs(5));
        assert_eq!(notify.workers, 8);
        assert_eq!(notify.queue_capacity, 1024);
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = NodeConfig::from_file(Path::new("/nonexistent/rsvd.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        for content in ["node_id = ", "listen = \"0.0.0.0:1\"", "node_id = \"a\"\nbogus = 1"] {
            let file = write_config(content);
            let err = NodeConfig::from_file(file.path()).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }), "{content:?}: {err}");
        }
    }

    #[test]
    fn rejects_self_among_peers() {
        let file = write_config(
            r#"
node_id = "node-a"
[[peers]]
id = "node-a"
url = "http://127.0.0.1:9001"
"#,
        );
        let config = NodeConfig::from_file(file.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Peers(DirectoryError::SelfInPeers(_))));
    }

    #[test]
    fn rejects_bad_notify_settings() {
        let mut config = NodeConfig::from_file(write_config(r#"node_id = "a""#).path()).unwrap();

        config.notify.timeout = "soon".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.notify.timeout = "0s".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.notify.timeout = "5s".into();
        config.notify.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.notify.workers = 1;
        config.notify.queue_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn overrides_take_precedence() {
        let file = write_config(FULL);
        let mut config = NodeConfig::from_file(file.path()).unwrap();

        config.apply(Overrides {
            node_id: Some("node-z".into()),
            listen: Some("127.0.0.1:7000".parse().unwrap()),
            peers: vec![
                parse_peer_arg("node-b=http://10.0.0.9:8080").unwrap(),
                parse_peer_arg("node-d=http://10.0.0.4:8080").unwrap(),
            ],
        });

        assert_eq!(config.node_id, "node-z");
        assert_eq!(config.listen.port(), 7000);
        let ids: Vec<_> = config.peers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["node-b", "node-c", "node-d"]);
        assert_eq!(config.peers[0].url, "http://10.0.0.9:8080");
        config.validate().unwrap();
    }

    #[test]
    fn peer_arg_parsing() {
        let entry = parse_peer_arg("node-b=http://h:1").unwrap();
        assert_eq!(entry.id, "node-b");
        assert_eq!(entry.url, "http://h:1");

        assert!(parse_peer_arg("node-b").is_err());
        assert!(parse_peer_arg("=http://h:1").is_err());
        assert!(parse_peer_arg("node-b=").is_err());
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("5h"), None);
    }

    #[test]
    fn parse_duration_overflow_is_rejected() {
        assert_eq!(parse_duration("307445734561825861m"), None);
        assert_eq!(parse_duration(&format!("{}s", u64::MAX)), None);
        assert_eq!(parse_duration(&format!("{}ms", u64::MAX)), Some(Duration::from_millis(u64::MAX)));
    }

    #[test]
    fn overflowing_timeout_fails_validation() {
        let file = write_config("node_id = \"a\"\n[notify]\ntimeout = \"307445734561825861m\"\n");
        let config = NodeConfig::from_file(file.path()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
