//! Server Info Module
//!
//! Diagnostics reported by the store's `INFO` command.

use serde::Serialize;

// == Server Info ==
/// Subset of `INFO` fields surfaced in cache health output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerInfo {
    /// Server version string
    pub redis_version: String,
    /// Number of connected clients
    pub connected_clients: u64,
    /// Human-readable memory usage
    pub used_memory_human: String,
    /// Successful key lookups
    pub keyspace_hits: u64,
    /// Failed key lookups
    pub keyspace_misses: u64,
}

impl ServerInfo {
    /// Parses the `field:value` lines of an `INFO` reply.
    ///
    /// Section headers, blank lines and unknown fields are skipped; fields that
    /// are missing or unparsable keep their defaults.
    pub fn parse(reply: &str) -> Self {
        let mut info = ServerInfo::default();

        for line in reply.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };

            match field {
                "redis_version" => info.redis_version = value.to_string(),
                "connected_clients" => info.connected_clients = value.parse().unwrap_or(0),
                "used_memory_human" => info.used_memory_human = value.to_string(),
                "keyspace_hits" => info.keyspace_hits = value.parse().unwrap_or(0),
                "keyspace_misses" => info.keyspace_misses = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        info
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.keyspace_hits + self.keyspace_misses;
        if total == 0 {
            0.0
        } else {
            self.keyspace_hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Server\r\n\
        redis_version:7.2.4\r\n\
        redis_mode:standalone\r\n\
        \r\n\
        # Clients\r\n\
        connected_clients:3\r\n\
        \r\n\
        # Memory\r\n\
        used_memory:1048576\r\n\
        used_memory_human:1.00M\r\n\
        \r\n\
        # Stats\r\n\
        keyspace_hits:80\r\n\
        keyspace_misses:20\r\n";

    #[test]
    fn test_parse_info_reply() {
        let info = ServerInfo::parse(SAMPLE);
        assert_eq!(info.redis_version, "7.2.4");
        assert_eq!(info.connected_clients, 3);
        assert_eq!(info.used_memory_human, "1.00M");
        assert_eq!(info.keyspace_hits, 80);
        assert_eq!(info.keyspace_misses, 20);
        assert!((info.hit_rate() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_parse_empty_reply() {
        let info = ServerInfo::parse("");
        assert_eq!(info, ServerInfo::default());
        assert_eq!(info.hit_rate(), 0.0);
    }

    #[test]
    fn test_parse_ignores_malformed_lines() {
        let info = ServerInfo::parse("garbage\nconnected_clients:many\nkeyspace_hits:5\n");
        assert_eq!(info.connected_clients, 0);
        assert_eq!(info.keyspace_hits, 5);
    }
}
