use serde::{Deserialize, Serialize};

/// iPad Safari identity; tablet-class layouts render consistently at 1024x768.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPad; CPU OS 9_3_5 like Mac OS X) AppleWebKit/601.1.46 (KHTML, like Gecko) Version/9.0 Mobile/13G36 Safari/601.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: String::from("0.0.0.0"),
            port: 5000,
        }
    }
}

/// Viewport and identity used for every capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportProfile {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub user_agent: String,
    pub mobile: bool,
}

impl Default for ViewportProfile {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            device_scale_factor: 1.0,
            user_agent: String::from(DEFAULT_USER_AGENT),
            mobile: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub navigation_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub consent_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub network_idle_ms: u64,
    pub extra_consent_selectors: Vec<String>,
    pub viewport: ViewportProfile,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 90,
            settle_delay_ms: 5000,
            consent_timeout_ms: 500,
            click_timeout_ms: 3000,
            network_idle_ms: 500,
            extra_consent_selectors: Vec::new(),
            viewport: ViewportProfile::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub webdriver_url: String,
    /// When set, the driver binary is spawned and owned by this process.
    pub driver_command: Option<String>,
    pub driver_args: Vec<String>,
    pub headless: bool,
    pub startup_timeout_secs: u64,
    /// Upper bound on any single WebDriver command other than navigation.
    pub command_timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            webdriver_url: String::from("http://127.0.0.1:9515"),
            driver_command: None,
            driver_args: Vec::new(),
            headless: true,
            startup_timeout_secs: 20,
            command_timeout_secs: 30,
        }
    }
}

fn default_branch() -> String {
    String::from("main")
}

fn default_directory() -> String {
    String::from("screenshots")
}

fn default_api_base() -> String {
    String::from("https://api.github.com")
}

fn default_name_prefix() -> String {
    String::from("screenshot_")
}

fn default_sequence_digits() -> usize {
    3
}

fn default_extension() -> String {
    String::from("png")
}

fn default_commit_message_prefix() -> String {
    String::from("sitecycle:")
}

/// GitHub repository that holds the remote capture history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Falls back to `GITHUB_TOKEN` when absent.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_sequence_digits")]
    pub sequence_digits: usize,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_commit_message_prefix")]
    pub commit_message_prefix: String,
}

impl RemoteConfig {
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}
