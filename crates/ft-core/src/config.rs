use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FragthreadConfig {
    pub log: LogConfig,
    pub codec: CodecConfig,
    pub share: ShareConfig,
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Capsule pipeline settings. Both ends of a link must agree on these:
/// the fragment does not record which codec produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Compression codec: "deflate" (default), "gzip" or "zstd"
    pub compression: String,
    /// Codec-specific compression level (deflate/gzip: 0-9, zstd: 1-22)
    pub level: u32,
    /// Upper bound on decompressed payload size in bytes
    pub max_decompressed_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Page URL that fragments are appended to (after '#')
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Avatar assigned when none is chosen
    pub default_avatar: u32,
    /// Number of selectable avatars
    pub avatar_count: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression: "deflate".into(),
            level: 6,
            max_decompressed_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".into(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_avatar: 0,
            avatar_count: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[log]
level = "debug"
format = "json"

[codec]
compression = "zstd"
level = 3
max_decompressed_bytes = 1048576

[share]
base_url = "https://threads.example.org/"

[profile]
default_avatar = 4
avatar_count = 20
"#;
        let config: FragthreadConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.codec.compression, "zstd");
        assert_eq!(config.codec.level, 3);
        assert_eq!(config.codec.max_decompressed_bytes, 1_048_576);
        assert_eq!(config.share.base_url, "https://threads.example.org/");
        assert_eq!(config.profile.default_avatar, 4);
        assert_eq!(config.profile.avatar_count, 20);
    }

    #[test]
    fn test_parse_defaults() {
        let config: FragthreadConfig = toml::from_str("").unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.codec.compression, "deflate");
        assert_eq!(config.codec.level, 6);
        assert_eq!(config.codec.max_decompressed_bytes, 16 * 1024 * 1024);
        assert_eq!(config.profile.avatar_count, 12);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[codec]
compression = "gzip"
"#;
        let config: FragthreadConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.codec.compression, "gzip");
        // Defaults
        assert_eq!(config.codec.level, 6);
        assert_eq!(config.share.base_url, "http://localhost:8080/");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = FragthreadConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: FragthreadConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.codec.compression, parsed.codec.compression);
        assert_eq!(config.share.base_url, parsed.share.base_url);
        assert_eq!(config.log.level, parsed.log.level);
    }
}
