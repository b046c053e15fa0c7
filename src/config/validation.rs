//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::EngineConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `EngineConfig`.
///
/// Maintained by hand to match the struct hierarchy in engine_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [tiers]
        "tiers",
        "tiers.min_reportable_n",
        "tiers.pattern_min_n",
        "tiers.established_min_n",
        "tiers.statistical_min_n",
        // [significance]
        "significance",
        "significance.alpha",
        "significance.strong_alpha",
        "significance.trend_alpha",
        // [effect_size]
        "effect_size",
        "effect_size.small",
        "effect_size.medium",
        "effect_size.large",
        // [lags]
        "lags",
        "lags.max_daily_lag",
        "lags.max_weekly_lag",
        "lags.min_lag_overlap",
        // [alignment]
        "alignment",
        "alignment.min_aligned_points",
        "alignment.min_week_coverage",
        // [stratification]
        "stratification",
        "stratification.min_stratum_n",
        "stratification.period_split",
        // [output]
        "output",
        "output.top_n",
        // [runtime]
        "runtime",
        "runtime.parallel",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Range Validation
// ============================================================================

/// Check values that parse fine but make no statistical sense.
///
/// Returns (errors, warnings). Errors must prevent startup; warnings are
/// suspicious calibrations an operator may still want.
pub fn validate_ranges(config: &EngineConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // A lag bound of a year would scan hundreds of hypotheses per pair
    if config.lags.max_daily_lag > 60 {
        errors.push(format!(
            "lags.max_daily_lag = {} exceeds 60 days; use weekly granularity for long lags",
            config.lags.max_daily_lag
        ));
    }
    if config.lags.max_weekly_lag > 26 {
        errors.push(format!(
            "lags.max_weekly_lag = {} exceeds 26 weeks",
            config.lags.max_weekly_lag
        ));
    }

    if config.significance.alpha > 0.1 {
        warnings.push(ValidationWarning {
            field: "significance.alpha".to_string(),
            message: format!(
                "significance.alpha = {:.3} is looser than the usual 0.05-0.10 range",
                config.significance.alpha
            ),
            suggestion: None,
        });
    }

    if config.tiers.statistical_min_n < 30 {
        warnings.push(ValidationWarning {
            field: "tiers.statistical_min_n".to_string(),
            message: format!(
                "tiers.statistical_min_n = {} is very low for the strongest tier",
                config.tiers.statistical_min_n
            ),
            suggestion: None,
        });
    }

    if config.output.top_n > 50 {
        warnings.push(ValidationWarning {
            field: "output.top_n".to_string(),
            message: format!(
                "output.top_n = {} is more findings than an athlete can act on",
                config.output.top_n
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("alpha", "alpha"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("statistcal", "statistical"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [tiers]
            statistical_min_n = 50
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"tiers".to_string()));
        assert!(keys.contains(&"tiers.statistical_min_n".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[tiers]
statistcal_min_n = 60
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("statistcal_min_n"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("tiers.statistical_min_n")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[significance]
alpha = 0.05

[output]
top_n = 8

[runtime]
parallel = false
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_default_ranges_clean() {
        let (errors, warnings) = validate_ranges(&EngineConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }

    #[test]
    fn test_unbounded_lag_is_an_error() {
        let mut config = EngineConfig::default();
        config.lags.max_daily_lag = 365;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("max_daily_lag")));
    }

    #[test]
    fn test_loose_alpha_warns() {
        let mut config = EngineConfig::default();
        config.significance.alpha = 0.2;
        let (_, warnings) = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "significance.alpha"));
    }
}
