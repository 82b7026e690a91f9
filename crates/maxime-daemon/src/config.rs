//! Daemon configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use directories::{BaseDirs, ProjectDirs};
use maxime_core::{
    BluetoothDevice, CardProfiles, EngineSettings, RetryPolicy, TargetMap, is_valid_address,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Paired wireless device
    pub bluetooth: BluetoothConfig,
    /// Managed stream
    pub stream: StreamConfig,
    /// Speaker output
    pub speakers: OutputConfig,
    /// Wired headset
    pub headset: HeadsetConfig,
    /// Wireless output
    pub wireless: OutputConfig,
    /// Wireless card profiles
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// Retry and timeout settings
    #[serde(default)]
    pub timing: TimingConfig,
    /// Desktop notifications
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_format: LogFormat::default() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Bluetooth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothConfig {
    /// Adapter identifier
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Hardware address of the paired device
    pub address: String,
}

fn default_adapter() -> String {
    "hci0".to_string()
}

/// Managed stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Media name of the stream to move
    pub name: String,
    /// Prefix stripped from the status output
    #[serde(default)]
    pub label_prefix: String,
}

/// An output-only target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Description of the output endpoint
    pub output: String,
}

/// Headset target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadsetConfig {
    /// Description of the output endpoint
    pub output: String,
    /// Description of the microphone
    pub input: String,
}

/// Card profile names used by resync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default = "default_a2dp")]
    pub a2dp: String,
    #[serde(default = "default_hands_free")]
    pub hands_free: String,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self { a2dp: default_a2dp(), hands_free: default_hands_free() }
    }
}

fn default_a2dp() -> String {
    "a2dp_sink".to_string()
}

fn default_hands_free() -> String {
    "headset_head_unit".to_string()
}

/// Timing settings, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait between lookups of the wireless sink after a connection
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
    /// Lookups before giving up on the wireless sink
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Pause inside resync and reconnect
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
    /// Deadline for each bluetoothctl invocation
    #[serde(default = "default_control_timeout")]
    pub control_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval(),
            retry_attempts: default_retry_attempts(),
            settle_ms: default_settle(),
            control_timeout_ms: default_control_timeout(),
        }
    }
}

fn default_retry_interval() -> u64 {
    1000
}

fn default_retry_attempts() -> u32 {
    30
}

fn default_settle() -> u64 {
    2000
}

fn default_control_timeout() -> u64 {
    10_000
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Send desktop notifications; when off they are only logged
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// How long notifications stay on screen
    #[serde(default = "default_ttl")]
    pub ttl_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_ms: default_ttl() }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u64 {
    5000
}

impl Config {
    /// Parse and validate configuration text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this schema or
    /// fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            is_valid_address(&self.bluetooth.address),
            "bluetooth.address '{}' is not a hardware address (expected AA:BB:CC:DD:EE:FF)",
            self.bluetooth.address
        );
        ensure!(!self.bluetooth.adapter.trim().is_empty(), "bluetooth.adapter must not be empty");

        for (key, value) in [
            ("stream.name", &self.stream.name),
            ("speakers.output", &self.speakers.output),
            ("headset.output", &self.headset.output),
            ("headset.input", &self.headset.input),
            ("wireless.output", &self.wireless.output),
            ("profiles.a2dp", &self.profiles.a2dp),
            ("profiles.hands_free", &self.profiles.hands_free),
        ] {
            ensure!(!value.trim().is_empty(), "{key} must not be empty");
        }

        ensure!(self.timing.retry_attempts > 0, "timing.retry_attempts must be at least 1");
        Ok(())
    }

    /// The paired device.
    #[must_use]
    pub fn device(&self) -> BluetoothDevice {
        BluetoothDevice::new(
            &self.bluetooth.address,
            &self.bluetooth.adapter,
            &self.wireless.output,
        )
    }

    /// Settings for the routing engine.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            stream_name: self.stream.name.clone(),
            targets: TargetMap::new(
                &self.speakers.output,
                &self.headset.output,
                &self.headset.input,
                &self.wireless.output,
            ),
            device: self.device(),
            profiles: CardProfiles {
                a2dp: self.profiles.a2dp.clone(),
                hands_free: self.profiles.hands_free.clone(),
            },
            retry: RetryPolicy {
                interval: Duration::from_millis(self.timing.retry_interval_ms),
                attempts: self.timing.retry_attempts,
            },
            settle_delay: self.settle_delay(),
            label_prefix: Some(self.stream.label_prefix.clone()).filter(|p| !p.is_empty()),
            notify_ttl: self.notify_ttl(),
        }
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_ms)
    }

    #[must_use]
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.control_timeout_ms)
    }

    #[must_use]
    pub fn notify_ttl(&self) -> Duration {
        Duration::from_millis(self.notifications.ttl_ms)
    }
}

/// Load configuration from `path`, or from the default location.
///
/// # Errors
/// Returns an error if the file is missing, unreadable, or invalid.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => expand_tilde(path),
        None => default_config_path()?,
    };

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
    let config = Config::from_toml(&content)
        .with_context(|| format!("Invalid config file: {config_path:?}"))?;

    debug!(?config_path, "Configuration loaded");
    Ok(config)
}

/// Get the default configuration file path.
fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "maxime").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[bluetooth]
address = "00:1b:66:aa:bb:cc"

[stream]
name = "LADSPA Stream"

[speakers]
output = "Built-in Audio Analog Stereo"

[headset]
output = "USB Headset Analog Stereo"
input = "USB Headset Mono"

[wireless]
output = "Bose QC35"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.daemon.log_format, LogFormat::Text);
        assert_eq!(config.bluetooth.adapter, "hci0");
        assert_eq!(config.profiles.a2dp, "a2dp_sink");
        assert_eq!(config.timing.retry_attempts, 30);
        assert!(config.notifications.enabled);
        assert_eq!(config.control_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_engine_settings() {
        let config = Config::from_toml(MINIMAL).unwrap();

        let settings = config.engine_settings();

        assert_eq!(settings.stream_name, "LADSPA Stream");
        assert_eq!(settings.device.address, "00:1B:66:AA:BB:CC");
        assert_eq!(settings.device.object_path(), "/org/bluez/hci0/dev_00_1B_66_AA_BB_CC");
        assert_eq!(settings.retry, RetryPolicy { interval: Duration::from_secs(1), attempts: 30 });
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
        assert_eq!(settings.label_prefix, None);
        assert_eq!(settings.targets.wireless.output.text, "Bose QC35");
    }

    #[test]
    fn test_overrides() {
        let content = format!(
            r#"{MINIMAL}
[daemon]
log_level = "debug"
log_format = "json"

[timing]
retry_attempts = 5
settle_ms = 500

[notifications]
enabled = false
"#
        );

        let config = Config::from_toml(&content).unwrap();

        assert_eq!(config.daemon.log_format, LogFormat::Json);
        assert_eq!(config.engine_settings().retry.attempts, 5);
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.timing.retry_interval_ms, 1000);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn test_label_prefix() {
        let content = MINIMAL.replace(
            r#"name = "LADSPA Stream""#,
            "name = \"LADSPA Stream\"\nlabel_prefix = \"EQ:\"",
        );

        let config = Config::from_toml(&content).unwrap();

        assert_eq!(config.engine_settings().label_prefix.as_deref(), Some("EQ:"));
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let content = MINIMAL.replace("00:1b:66:aa:bb:cc", "00:1b:66");

        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.to_string().contains("bluetooth.address"));
    }

    #[test]
    fn test_empty_descriptor_is_rejected() {
        let content = MINIMAL.replace("output = \"Bose QC35\"", "output = \"  \"");

        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.to_string().contains("wireless.output"));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let content = format!("{MINIMAL}\n[timing]\nretry_attempts = 0\n");

        assert!(Config::from_toml(&content).is_err());
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let content = MINIMAL.replace("[wireless]\noutput = \"Bose QC35\"\n", "");

        assert!(Config::from_toml(&content).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.wireless.output, "Bose QC35");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_tilde(Path::new("~/.config/maxime/config.toml"));

        if let Some(dirs) = BaseDirs::new() {
            assert_eq!(expanded, dirs.home_dir().join(".config/maxime/config.toml"));
        }
        assert_eq!(expand_tilde(Path::new("/etc/maxime.toml")), PathBuf::from("/etc/maxime.toml"));
    }
}
