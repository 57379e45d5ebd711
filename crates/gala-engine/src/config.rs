use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl EngineConfig {
    /// Build a config from `GALA_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Connection settings for the OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether the model path is attempted at all. When false every
    /// extraction goes straight to the heuristic path.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Bound on the whole completion round-trip; expiry routes the call to
    /// the heuristic path.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434/v1".into(),
            model: "llama3.2".into(),
            max_tokens: 700,
            temperature: 0.2,
            timeout_secs: 12,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("GALA_LLM_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.enabled),
            base_url: std::env::var("GALA_LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("GALA_LLM_MODEL").unwrap_or(defaults.model),
            max_tokens: std::env::var("GALA_LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: std::env::var("GALA_LLM_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            timeout_secs: std::env::var("GALA_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Behavioral constants of the extraction heuristics. These reproduce the
/// product's historical defaults; they are compatibility behavior, not
/// inferred intent, so change them only deliberately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Guest count assumed when the text names none.
    pub default_guests: u32,
    /// Start assumed when the text names no time, 24-hour "HH:MM".
    pub default_start_time: String,
    /// Duration assumed when the text names no end time or duration.
    pub default_duration_hours: u32,
    /// `max_attendees = max(round(guests * headroom), floor)` when the
    /// text does not state a limit.
    pub attendee_headroom: f64,
    pub attendee_floor: u32,
    /// Venue-hours window used for proposal validation warnings.
    pub venue_opens: String,
    pub venue_closes: String,
    /// Window before event start inside which an edit is flagged high
    /// urgency, in hours.
    pub urgency_window_hours: i64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_guests: 10,
            default_start_time: "18:00".into(),
            default_duration_hours: 2,
            attendee_headroom: 1.5,
            attendee_floor: 20,
            venue_opens: "08:00".into(),
            venue_closes: "23:00".into(),
            urgency_window_hours: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_defaults_match_product_history() {
        let config = ExtractionConfig::default();
        assert_eq!(config.default_guests, 10);
        assert_eq!(config.default_start_time, "18:00");
        assert_eq!(config.default_duration_hours, 2);
        assert_eq!(config.attendee_floor, 20);
        assert_eq!(config.urgency_window_hours, 48);
    }

    #[test]
    fn llm_disabled_by_default() {
        assert!(!LlmConfig::default().enabled);
    }
}
