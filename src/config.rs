//! Runtime configuration: cooldown, classifier thresholds, and bindings.
//!
//! Config files are s-expression plists:
//!
//! ```text
//! (:cooldown-ms 1000
//!  :ok-pinch-threshold 0.05
//!  :wave-spread-threshold 0.2
//!  :bindings ((:gesture "v-sign" :label "Browser" :command "xdg-open https://www.google.com")))
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use lexpr::Value;
use tracing::debug;

use crate::dispatch::DEFAULT_COOLDOWN;
use crate::hand::{ClassifierConfig, GestureId};
use crate::sexp;

/// What the host does when a gesture fires.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub gesture: GestureId,
    /// Short description shown in logs (e.g. "Browser").
    pub label: String,
    /// Shell command to run; `None` only logs the label.
    pub command: Option<String>,
}

impl Binding {
    pub fn new(gesture: GestureId, label: &str, command: Option<&str>) -> Self {
        Self {
            gesture,
            label: label.to_string(),
            command: command.map(str::to_string),
        }
    }

    fn from_sexp(value: &Value) -> anyhow::Result<Self> {
        let name = sexp::get_text(value, "gesture").context("binding missing :gesture")?;
        let gesture: GestureId = name.parse()?;
        let label = sexp::get_text(value, "label")
            .unwrap_or_else(|| gesture.display_name().to_string());
        let command = sexp::get(value, "command")
            .filter(|v| !sexp::is_nil(v))
            .map(|v| sexp::as_text(v).context("binding :command must be a string"))
            .transpose()?;
        Ok(Self {
            gesture,
            label,
            command,
        })
    }

    fn to_sexp(&self) -> String {
        format!(
            "(:gesture \"{}\" :label \"{}\" :command {})",
            self.gesture,
            sexp::escape_string(&self.label),
            self.command
                .as_deref()
                .map(|c| format!("\"{}\"", sexp::escape_string(c)))
                .unwrap_or_else(|| "nil".to_string()),
        )
    }
}

/// Bindings used when no config file supplies any.
///
/// Labels only; commands are platform specific and left to the config.
pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(GestureId::VSign, "Browser", None),
        Binding::new(GestureId::Like, "Notepad", None),
        Binding::new(GestureId::Ok, "Calculator", None),
        Binding::new(GestureId::Call, "E-mail", None),
        Binding::new(GestureId::Wave, "Close app", None),
    ]
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HandsignConfig {
    /// Minimum time between two dispatched actions.
    pub cooldown: Duration,
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
    /// One binding per gesture at most.
    pub bindings: Vec<Binding>,
}

impl Default for HandsignConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            classifier: ClassifierConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl HandsignConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_sexp(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        debug!("Loaded config from {}: {}", path.display(), config.config_sexp());
        Ok(config)
    }

    /// Parse a config plist.  Missing keys keep their defaults.
    pub fn from_sexp(raw: &str) -> anyhow::Result<Self> {
        let value = sexp::parse(raw)?;
        let mut config = Self::default();

        if let Some(v) = sexp::get(&value, "cooldown-ms") {
            let ms = sexp::as_f64(v).context(":cooldown-ms must be a number")?;
            if !ms.is_finite() || ms <= 0.0 {
                bail!(":cooldown-ms must be positive, got {}", ms);
            }
            config.cooldown = Duration::try_from_secs_f64(ms / 1000.0)
                .with_context(|| format!(":cooldown-ms {} is out of range", ms))?;
        }
        if let Some(v) = sexp::get(&value, "ok-pinch-threshold") {
            config.classifier.ok_pinch_threshold =
                sexp::as_f64(v).context(":ok-pinch-threshold must be a number")? as f32;
        }
        if let Some(v) = sexp::get(&value, "wave-spread-threshold") {
            config.classifier.wave_spread_threshold =
                sexp::as_f64(v).context(":wave-spread-threshold must be a number")? as f32;
        }
        if let Some(v) = sexp::get(&value, "bindings") {
            let items = sexp::list_items(v).context(":bindings must be a list")?;
            config.bindings = items
                .into_iter()
                .map(Binding::from_sexp)
                .collect::<anyhow::Result<_>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the loop relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cooldown.is_zero() {
            bail!("cooldown must be positive");
        }
        for (name, value) in [
            ("ok-pinch-threshold", self.classifier.ok_pinch_threshold),
            ("wave-spread-threshold", self.classifier.wave_spread_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{} must be a positive number, got {}", name, value);
            }
        }
        for (i, b) in self.bindings.iter().enumerate() {
            if self.bindings[..i].iter().any(|o| o.gesture == b.gesture) {
                bail!("gesture {} is bound more than once", b.gesture);
            }
        }
        Ok(())
    }

    /// Binding for a gesture, if any.
    pub fn binding(&self, gesture: GestureId) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.gesture == gesture)
    }

    /// Generate s-expression of the active configuration.
    pub fn config_sexp(&self) -> String {
        let bindings = if self.bindings.is_empty() {
            "nil".to_string()
        } else {
            format!(
                "({})",
                self.bindings
                    .iter()
                    .map(Binding::to_sexp)
                    .collect::<Vec<_>>()
                    .join(" ")
            )
        };
        format!(
            "(:cooldown-ms {} :ok-pinch-threshold {:.3} :wave-spread-threshold {:.3} :bindings {})",
            self.cooldown.as_millis(),
            self.classifier.ok_pinch_threshold,
            self.classifier.wave_spread_threshold,
            bindings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandsignConfig::default();
        assert_eq!(config.cooldown, Duration::from_secs(1));
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.bindings.len(), 5);
        assert_eq!(config.binding(GestureId::Wave).unwrap().label, "Close app");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full() {
        let raw = r#"(:cooldown-ms 1500
                     :ok-pinch-threshold 0.04
                     :wave-spread-threshold 0.25
                     :bindings ((:gesture "v-sign" :label "Browser" :command "xdg-open https://example.org")
                                (:gesture "wave")))"#;
        let config = HandsignConfig::from_sexp(raw).unwrap();
        assert_eq!(config.cooldown, Duration::from_millis(1500));
        assert!((config.classifier.ok_pinch_threshold - 0.04).abs() < 1e-6);
        assert!((config.classifier.wave_spread_threshold - 0.25).abs() < 1e-6);
        assert_eq!(config.bindings.len(), 2);
        assert_eq!(
            config.binding(GestureId::VSign).unwrap().command.as_deref(),
            Some("xdg-open https://example.org")
        );
        let wave = config.binding(GestureId::Wave).unwrap();
        assert_eq!(wave.label, "Wave");
        assert!(wave.command.is_none());
        assert!(config.binding(GestureId::Like).is_none());
    }

    #[test]
    fn test_parse_partial_keeps_defaults() {
        let config = HandsignConfig::from_sexp("(:cooldown-ms 250)").unwrap();
        assert_eq!(config.cooldown, Duration::from_millis(250));
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.bindings, default_bindings());
    }

    #[test]
    fn test_empty_bindings() {
        let config = HandsignConfig::from_sexp("(:bindings nil)").unwrap();
        assert!(config.bindings.is_empty());
        assert!(config.config_sexp().contains(":bindings nil"));
    }

    #[test]
    fn test_rejects_non_positive_cooldown() {
        assert!(HandsignConfig::from_sexp("(:cooldown-ms 0)").is_err());
        assert!(HandsignConfig::from_sexp("(:cooldown-ms -5)").is_err());
    }

    #[test]
    fn test_rejects_huge_cooldown() {
        let err = HandsignConfig::from_sexp("(:cooldown-ms 99999999999999999999999999999.0)")
            .unwrap_err();
        assert!(err.to_string().contains("out of range"), "got {}", err);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = HandsignConfig::from_sexp("(:ok-pinch-threshold -0.1)").unwrap_err();
        assert!(err.to_string().contains("ok-pinch-threshold"), "got {}", err);
        assert!(HandsignConfig::from_sexp("(:wave-spread-threshold \"wide\")").is_err());
    }

    #[test]
    fn test_rejects_unknown_gesture() {
        let err = HandsignConfig::from_sexp(r#"(:bindings ((:gesture "pinch")))"#).unwrap_err();
        assert!(format!("{:#}", err).contains("pinch"), "got {:#}", err);
    }

    #[test]
    fn test_rejects_duplicate_binding() {
        let raw = r#"(:bindings ((:gesture "ok") (:gesture "ok")))"#;
        assert!(HandsignConfig::from_sexp(raw).is_err());
    }

    #[test]
    fn test_config_sexp() {
        let sexp = HandsignConfig::default().config_sexp();
        assert!(sexp.contains(":cooldown-ms 1000"));
        assert!(sexp.contains(":ok-pinch-threshold 0.050"));
        assert!(sexp.contains(":wave-spread-threshold 0.200"));
        assert!(sexp.contains("(:gesture \"like\" :label \"Notepad\" :command nil)"));
    }

    #[test]
    fn test_demo_config_parses() {
        let config = HandsignConfig::from_sexp(include_str!("../demos/handsign.sexp")).unwrap();
        assert_eq!(config.bindings.len(), 5);
        assert_eq!(
            config.binding(GestureId::Ok).unwrap().command.as_deref(),
            Some("gnome-calculator")
        );
    }

    #[test]
    fn test_config_sexp_roundtrip() {
        let mut config = HandsignConfig::default();
        config.bindings[0].command = Some("echo \"hi\"".to_string());
        let parsed = HandsignConfig::from_sexp(&config.config_sexp()).unwrap();
        assert_eq!(parsed, config);
    }
}
