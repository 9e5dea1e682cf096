// tests/config_loading.rs

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::{NamedTempFile, TempDir};
use sitevisor::config::{
    load_from_path, load_or_create, parse_sites, FileSiteRegistry, SiteConfig, SiteList,
    SiteRegistry,
};
use sitevisor::errors::SitevisorError;
use sitevisor::fs::mock::MockFileSystem;

const TWO_SITES: &str = r#"
[
  { "id": "youtube", "name": "YouTube", "url": "https://youtube.com", "autostart": true },
  { "id": "radio", "name": "Radio", "url": "https://radio.example" }
]
"#;

#[test]
fn missing_file_is_created_with_default_site() {
    let fs = MockFileSystem::new();

    let sites = load_or_create(&fs, "conf/sites.json").unwrap();

    assert_eq!(sites.len(), 1);
    let site = sites.get("youtube").expect("default site");
    assert_eq!(site.name, "YouTube");
    assert_eq!(site.url, "https://youtube.com");
    assert!(!site.autostart);

    let written = fs.contents("conf/sites.json").expect("file written");
    assert!(written.contains("\n  {"), "pretty printed with two-space indent");
    let reparsed = parse_sites(&written).unwrap();
    assert_eq!(reparsed, vec![SiteConfig::default_site()]);
}

#[test]
fn existing_file_is_left_alone() {
    let fs = MockFileSystem::new();
    fs.add_file("sites.json", TWO_SITES);

    let sites = load_or_create(&fs, "sites.json").unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites.autostart_ids(), vec!["youtube".to_string()]);
    assert!(!sites.get("radio").unwrap().autostart, "autostart defaults to false");
    assert_eq!(fs.contents("sites.json").unwrap(), TWO_SITES);
}

#[test]
fn create_failure_is_an_error() {
    let fs = MockFileSystem::read_only();

    let result = load_or_create(&fs, "sites.json");

    assert!(matches!(result, Err(SitevisorError::Other(_))), "{result:?}");
}

#[test]
fn malformed_json_is_a_json_error() {
    let fs = MockFileSystem::new();
    fs.add_file("sites.json", "[{ \"id\": ");

    let result = load_from_path(&fs, Path::new("sites.json"));

    assert!(matches!(result, Err(SitevisorError::JsonError(_))), "{result:?}");
}

#[test]
fn duplicate_ids_are_rejected() {
    let result = SiteList::try_from(vec![
        SiteConfig::new("a", "A", "https://a.example"),
        SiteConfig::new("a", "A again", "https://a2.example"),
    ]);

    match result {
        Err(SitevisorError::ConfigError(msg)) => assert!(msg.contains("duplicate site id 'a'")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn empty_fields_and_lists_are_rejected() {
    let cases = vec![
        (vec![], "at least one site"),
        (vec![SiteConfig::new("", "x", "https://x")], "empty `id`"),
        (vec![SiteConfig::new("two words", "x", "https://x")], "whitespace"),
        (vec![SiteConfig::new("x", "x", " ")], "empty `url`"),
    ];

    for (sites, expected) in cases {
        match SiteList::try_from(sites) {
            Err(SitevisorError::ConfigError(msg)) => {
                assert!(msg.contains(expected), "{msg:?} should mention {expected:?}")
            }
            other => panic!("Expected ConfigError, got: {:?}", other),
        }
    }
}

#[test]
fn real_file_round_trip_through_tempfile() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", TWO_SITES).unwrap();

    let sites = load_from_path(&sitevisor::fs::RealFileSystem, file.path()).unwrap();

    let ids: Vec<_> = sites.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["youtube", "radio"]);
}

#[test]
fn file_registry_creates_missing_file_in_new_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sites.json");

    let registry = FileSiteRegistry::open_real(&path).unwrap();

    assert!(path.exists());
    assert_eq!(registry.path(), path.as_path());
    assert!(registry.resolve("youtube").unwrap().is_some());
}

#[test]
fn file_registry_sees_edits_on_next_resolve() {
    let fs = MockFileSystem::new();
    fs.add_file("sites.json", TWO_SITES);
    let registry = FileSiteRegistry::open(Arc::new(fs.clone()), "sites.json").unwrap();

    assert!(registry.resolve("podcast").unwrap().is_none());

    fs.add_file(
        "sites.json",
        r#"[{ "id": "podcast", "name": "Podcast", "url": "https://pod.example" }]"#,
    );

    let podcast = registry.resolve("podcast").unwrap().expect("new site visible");
    assert_eq!(podcast.url, "https://pod.example");
    assert!(registry.resolve("youtube").unwrap().is_none());
}
