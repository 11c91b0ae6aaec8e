// tests/tables_config.rs
// Loading ranking tables from files and the environment.

use pulse_rank::tables::{RankingTables, DEFAULT_TABLES, ENV_TABLES_PATH};
use std::{env, fs};

#[test]
fn shipped_config_matches_builtin_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/ranking.toml");
    let t = RankingTables::load_from_file(path).expect("load config/ranking.toml");
    assert_eq!(t, *DEFAULT_TABLES);
}

#[test]
fn loads_json_and_toml_files() {
    let dir = tempfile::tempdir().unwrap();

    let json_p = dir.path().join("tables.json");
    fs::write(&json_p, r#"{"default_weight": 0.5, "broad_terms": ["Tariffs"]}"#).unwrap();
    let t = RankingTables::load_from_file(&json_p).unwrap();
    assert!((t.default_weight - 0.5).abs() < 1e-12);
    assert!(t.broad_terms.contains("tariffs"));
    assert_eq!(t.niche_terms, DEFAULT_TABLES.niche_terms);

    let toml_p = dir.path().join("tables.toml");
    fs::write(&toml_p, "major_outlets = [\"Le Monde\"]\n").unwrap();
    let t = RankingTables::load_from_file(&toml_p).unwrap();
    assert!(t.is_major_outlet("Le Monde"));
    assert!(!t.is_major_outlet("Reuters"));
}

#[test]
fn missing_or_broken_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(RankingTables::load_from_file(dir.path().join("nope.toml")).is_err());

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "default_weight = \"heavy\"").unwrap();
    let err = RankingTables::load_from_file(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"));
}

#[serial_test::serial]
#[test]
fn env_var_selects_tables_file() {
    env::remove_var(ENV_TABLES_PATH);
    assert_eq!(RankingTables::from_env().unwrap(), *DEFAULT_TABLES);

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("tables.toml");
    fs::write(&p, "default_weight = 2.5\n").unwrap();
    env::set_var(ENV_TABLES_PATH, p.display().to_string());
    let t = RankingTables::from_env().unwrap();
    assert!((t.default_weight - 2.5).abs() < 1e-12);

    env::set_var(ENV_TABLES_PATH, dir.path().join("missing.toml"));
    assert!(RankingTables::from_env().is_err());

    env::remove_var(ENV_TABLES_PATH);
}
