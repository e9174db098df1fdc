use coalesce_tuner::config::{
    ENV_HISTORY, ENV_SEED, ENV_SPACE, ENV_STRATEGY, ENV_VERBOSE, ENV_WINDOW,
};
use coalesce_tuner::{Strategy, TunerConfig, TunerError};
use rstest::rstest;
use std::collections::HashMap;
use std::path::Path;
use strum::IntoEnumIterator;

fn config_from(pairs: &[(&str, &str)]) -> TunerConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    TunerConfig::from_lookup(|key| env.get(key).cloned())
}

#[rstest]
#[case("", Strategy::NelderMead)]
#[case("   ", Strategy::NelderMead)]
#[case("GRADIENT_DESCENT", Strategy::NelderMead)]
#[case("EXHAUSTIVE", Strategy::Exhaustive)]
#[case("exhaustive", Strategy::Exhaustive)]
#[case("Random", Strategy::Random)]
#[case("  RANDOM  ", Strategy::Random)]
#[case("nelder_mead", Strategy::NelderMead)]
#[case("PARALLEL_RANK_ORDER", Strategy::ParallelRankOrder)]
#[case("parallel_rank_order", Strategy::ParallelRankOrder)]
fn test_strategy_from_setting(#[case] raw: &str, #[case] expected: Strategy) {
    assert_eq!(Strategy::from_setting(raw), expected);
}

#[test]
fn test_strategy_names_round_trip() {
    for strategy in Strategy::iter() {
        let name = strategy.to_string();
        assert_eq!(name, name.to_uppercase());
        assert_eq!(Strategy::from_setting(&name), strategy);
    }
    assert_eq!(Strategy::ParallelRankOrder.to_string(), "PARALLEL_RANK_ORDER");
    assert_eq!(
        serde_json::to_string(&Strategy::NelderMead).unwrap(),
        "\"NELDER_MEAD\""
    );
}

#[test]
fn test_empty_environment_gives_defaults() {
    let config = config_from(&[]);
    assert!(!config.verbose);
    assert_eq!(config.window, 3);
    assert_eq!(config.strategy, Strategy::NelderMead);
    assert!(!config.use_history());
    assert!(config.space_file.is_none());
    assert!(config.seed.is_none());
    assert_eq!(config.region, "time per transaction");
}

#[test]
fn test_verbose_is_enabled_by_presence() {
    assert!(config_from(&[(ENV_VERBOSE, "")]).verbose);
    assert!(config_from(&[(ENV_VERBOSE, "0")]).verbose);
}

#[rstest]
#[case("8", 8)]
#[case(" 5 ", 5)]
#[case("1", 1)]
#[case("0", 3)]
#[case("-2", 3)]
#[case("many", 3)]
#[case("", 3)]
fn test_window_parsing(#[case] raw: &str, #[case] expected: usize) {
    assert_eq!(config_from(&[(ENV_WINDOW, raw)]).window, expected);
}

#[test]
fn test_strategy_from_environment() {
    let config = config_from(&[(ENV_STRATEGY, "exhaustive")]);
    assert_eq!(config.strategy, Strategy::Exhaustive);
    let config = config_from(&[(ENV_STRATEGY, "SIMULATED_ANNEALING")]);
    assert_eq!(config.strategy, Strategy::NelderMead);
}

#[test]
fn test_history_requires_non_empty_path() {
    assert!(!config_from(&[(ENV_HISTORY, "")]).use_history());

    let config = config_from(&[(ENV_HISTORY, "/tmp/coalesce_history.csv")]);
    assert!(config.use_history());
    assert_eq!(
        config.history_path(),
        Some(Path::new("/tmp/coalesce_history.csv"))
    );
}

#[test]
fn test_space_file_and_seed() {
    let config = config_from(&[(ENV_SPACE, "space.json"), (ENV_SEED, "42")]);
    assert_eq!(config.space_file.as_deref(), Some(Path::new("space.json")));
    assert_eq!(config.seed, Some(42));

    assert_eq!(config_from(&[(ENV_SEED, "forty-two")]).seed, None);
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: TunerConfig =
        serde_json::from_str(r#"{"window": 6, "strategy": "RANDOM"}"#).unwrap();
    assert_eq!(config.window, 6);
    assert_eq!(config.strategy, Strategy::Random);
    assert_eq!(config.region, "time per transaction");
}

#[test]
fn test_validate_rejects_unusable_settings() {
    assert!(TunerConfig::default().validate().is_ok());

    let zero_window = TunerConfig {
        window: 0,
        ..Default::default()
    };
    assert!(matches!(zero_window.validate(), Err(TunerError::Config(_))));

    let no_region = TunerConfig {
        region: "  ".to_string(),
        ..Default::default()
    };
    assert!(matches!(no_region.validate(), Err(TunerError::Config(_))));
}
