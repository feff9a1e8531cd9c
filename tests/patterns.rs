// tests/patterns.rs

mod common;
use crate::common::builders::watch_target;

use std::path::Path;

use proptest::prelude::*;
use workerwatch::types::WatchConfig;
use workerwatch::watch::{matches_pattern, parse_watch_pattern, WatchMatcher};

#[test]
fn recursive_pattern_splits_at_double_star() {
    let cfg = parse_watch_pattern("./src/**/*.php", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/srv/app/src"));
    assert_eq!(cfg.pattern, "**/*.php");
    assert!(cfg.recursive);
}

#[test]
fn single_level_pattern_is_not_recursive() {
    let cfg = parse_watch_pattern("./src/*.php", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/srv/app/src"));
    assert_eq!(cfg.pattern, "*.php");
    assert!(!cfg.recursive);
}

#[test]
fn file_name_pattern_watches_its_directory() {
    let cfg = parse_watch_pattern("config/app.yaml", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/srv/app/config"));
    assert_eq!(cfg.pattern, "app.yaml");
    assert!(!cfg.recursive);
}

#[test]
fn bare_directory_watches_everything_below_it() {
    let cfg = parse_watch_pattern("./config", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/srv/app/config"));
    assert_eq!(cfg.pattern, "**");
    assert!(cfg.recursive);
}

#[test]
fn absolute_pattern_ignores_base() {
    let cfg = parse_watch_pattern("/var/www/**/*.{php,twig}", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/var/www"));
    assert_eq!(cfg.pattern, "**/*.{php,twig}");
    assert!(cfg.recursive);
}

#[test]
fn pattern_without_directory_watches_base() {
    let cfg = parse_watch_pattern("*.txt", Path::new("/srv/app")).unwrap();
    assert_eq!(cfg.directory, Path::new("/srv/app"));
    assert_eq!(cfg.pattern, "*.txt");
}

#[test]
fn empty_pattern_is_rejected() {
    assert!(parse_watch_pattern("   ", Path::new("/srv/app")).is_err());
}

#[test]
fn matches_only_configured_extension() {
    let cfg = watch_target("/srv/app", "**/*.txt");
    assert!(matches_pattern(Path::new("/srv/app/a.txt"), &cfg));
    assert!(matches_pattern(Path::new("/srv/app/deep/er/a.txt"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/app/a.json"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/app/a.txt.bak"), &cfg));
}

#[test]
fn single_star_does_not_cross_directories() {
    let cfg = WatchConfig::new("/srv/app", "*.txt", true);
    assert!(matches_pattern(Path::new("/srv/app/a.txt"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/app/sub/a.txt"), &cfg));
}

#[test]
fn non_recursive_config_ignores_nested_paths() {
    let cfg = WatchConfig::new("/srv/app", "**/*.txt", false);
    assert!(matches_pattern(Path::new("/srv/app/a.txt"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/app/sub/a.txt"), &cfg));
}

#[test]
fn paths_outside_the_directory_never_match() {
    let cfg = watch_target("/srv/app", "**");
    assert!(matches_pattern(Path::new("/srv/app/x"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/other/x"), &cfg));
    assert!(!matches_pattern(Path::new("/srv/app"), &cfg));
}

#[test]
fn invalid_glob_never_matches() {
    let matcher = WatchMatcher::new(WatchConfig::new("/srv/app", "[", true));
    assert!(!matcher.matches(Path::new("/srv/app/[")));
}

proptest! {
    #[test]
    fn extension_pattern_gates_on_extension(
        dirs in proptest::collection::vec("[a-z]{1,8}", 0..4),
        stem in "[a-zA-Z0-9_-]{1,12}",
    ) {
        let cfg = watch_target("/srv/app", "**/*.txt");
        let mut rel = dirs.join("/");
        if !rel.is_empty() {
            rel.push('/');
        }

        let txt = format!("/srv/app/{rel}{stem}.txt");
        let json = format!("/srv/app/{rel}{stem}.json");

        prop_assert!(matches_pattern(Path::new(&txt), &cfg));
        prop_assert!(!matches_pattern(Path::new(&json), &cfg));
    }
}
