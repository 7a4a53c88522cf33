use serde::{Deserialize, Serialize};

/// How `update_status` treats the requested target state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may be set from any other. Administrators rely on this
    /// to correct mistakes, e.g. reopening a wrongly rejected complaint.
    #[default]
    Permissive,
    /// Only the edges of the lifecycle diagram are accepted.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub departments: Vec<String>,
    pub categories: Vec<String>,
    pub transition_policy: TransitionPolicy,
    /// Bounded retries when a generated tracking id is already taken.
    pub tracking_id_attempts: u32,
    /// Bounded retries when the collection changed between load and replace.
    pub write_attempts: u32,
    /// Classifier safety net when the oracle is unavailable.
    pub fallback_keywords: Vec<String>,
    pub seed_demo_data: bool,
    pub oracle: OracleConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            departments: strings(&[
                "Electricity",
                "Water Supply",
                "Municipal/Corporation",
                "Health",
                "Transport",
                "Police",
                "Education",
                "Social Welfare",
                "Revenue",
                "Other",
            ]),
            categories: strings(&[
                "Service Issue",
                "Infrastructure",
                "Harassment/Misconduct",
                "Safety Hazard",
                "Sanitation",
                "Delay",
                "Other",
            ]),
            transition_policy: TransitionPolicy::Permissive,
            tracking_id_attempts: 8,
            write_attempts: 3,
            fallback_keywords: strings(&[
                "danger",
                "fire",
                "blood",
                "accident",
                "death",
                "emergency",
                "shock",
                "harassment",
            ]),
            seed_demo_data: true,
            oracle: OracleConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PortalConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.tracking_id_attempts == 0 || config.write_attempts == 0 {
            anyhow::bail!("{path}: retry budgets must be at least 1");
        }
        Ok(config)
    }

    /// Config for tests: no network, no demo records.
    pub fn default_test() -> Self {
        Self {
            seed_demo_data: false,
            oracle: OracleConfig {
                enabled: false,
                timeout_secs: 1,
                ..OracleConfig::default()
            },
            ..Self::default()
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
