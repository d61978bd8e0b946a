// Response parsing: normalization, soft-absent fields and the two failure kinds

use nixpkgs_search::{SearchEngine, SearchError};
use serde_json::json;

use super::common::{backend_response, package_hit, test_engine};

#[test]
fn test_full_hit_is_normalized() {
    let body = backend_response(vec![package_hit("ripgrep", "pkgs/by-name/ri/ripgrep/package.nix:31")]);

    let results = test_engine(false).response(&body).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.title, "ripgrep");
    assert_eq!(result.package_name, "ripgrep");
    assert_eq!(result.version, "1.0.0");
    assert_eq!(result.content, "The ripgrep package");
    assert_eq!(
        result.source_code_url,
        "https://github.com/NixOS/nixpkgs/blob/master/pkgs/by-name/ri/ripgrep/package.nix#L31"
    );
    assert_eq!(
        result.url,
        "https://search.nixos.org/packages?channel=unstable&show=ripgrep"
    );
    assert_eq!(result.maintainer, "alice, bob");
    assert_eq!(result.tags, vec!["ripgrep".to_string()]);
    assert_eq!(result.license_name, "MIT, Apache-2.0");
    assert_eq!(result.homepage.as_deref(), Some("https://ripgrep.example.org"));
    assert!(result.metadata.is_none());
}

#[test]
fn test_hits_keep_backend_order() {
    let names = ["zsh", "bash", "fish", "nushell", "dash"];
    let hits = names
        .iter()
        .enumerate()
        .map(|(i, name)| package_hit(name, &format!("pkgs/shells/{}/default.nix:{}", name, i + 1)))
        .collect();

    let results = test_engine(false).response(&backend_response(hits)).unwrap();

    assert_eq!(results.len(), names.len());
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, names);
}

#[test]
fn test_empty_hit_list() {
    let results = test_engine(false).response(&backend_response(vec![])).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_maintainers_joined() {
    let mut hit = package_hit("hello", "pkgs/hello/default.nix:1");
    hit["_source"]["package_maintainers_set"] = json!(["a", "b"]);

    let results = test_engine(false).response(&backend_response(vec![hit])).unwrap();
    assert_eq!(results[0].maintainer, "a, b");
}

#[test]
fn test_empty_homepage_is_null() {
    let mut hit = package_hit("hello", "pkgs/hello/default.nix:1");
    hit["_source"]["package_homepage"] = json!([]);

    let results = test_engine(false).response(&backend_response(vec![hit])).unwrap();
    assert!(results[0].homepage.is_none());

    let serialized = serde_json::to_value(&results[0]).unwrap();
    assert!(serialized["homepage"].is_null());
}

#[test]
fn test_position_to_github_url() {
    let hit = package_hit("foo", "pkgs/foo/default.nix:42");

    let results = test_engine(false).response(&backend_response(vec![hit])).unwrap();
    assert_eq!(
        results[0].source_code_url,
        "https://github.com/NixOS/nixpkgs/blob/master/pkgs/foo/default.nix#L42"
    );
}

#[test]
fn test_position_without_colon_is_malformed() {
    let hits = vec![
        package_hit("ok", "pkgs/ok/default.nix:7"),
        package_hit("foo", "pkgs/foo/default.nix"),
    ];

    let result = test_engine(false).response(&backend_response(hits));

    match result {
        Err(SearchError::MalformedField { field, value, .. }) => {
            assert_eq!(field, "package_position");
            assert_eq!(value, "pkgs/foo/default.nix");
        }
        other => panic!("expected MalformedField, got {:?}", other),
    }
}

#[test]
fn test_missing_fields_are_soft_absent() {
    let body = json!({
        "hits": {"hits": [
            {"_source": {"package_attr_name": "bare"}},
            {}
        ]}
    });

    let results = test_engine(true).response(&body.to_string()).unwrap();

    assert_eq!(results.len(), 2);
    let bare = &results[0];
    assert_eq!(bare.title, "bare");
    assert_eq!(bare.package_name, "");
    assert_eq!(bare.version, "");
    assert_eq!(bare.content, "");
    assert_eq!(bare.source_code_url, "");
    assert_eq!(bare.maintainer, "");
    assert!(bare.tags.is_empty());
    assert_eq!(bare.license_name, "");
    assert!(bare.homepage.is_none());

    // Same schema for every result, whatever the backend sent
    let first = serde_json::to_value(&results[0]).unwrap();
    let second = serde_json::to_value(&results[1]).unwrap();
    let first_keys: Vec<&String> = first.as_object().unwrap().keys().collect();
    let second_keys: Vec<&String> = second.as_object().unwrap().keys().collect();
    assert_eq!(first_keys, second_keys);
}

#[test]
fn test_backend_error_string() {
    let body = json!({"error": "Unauthorized"}).to_string();

    match test_engine(false).response(&body) {
        Err(SearchError::BackendApi { message }) => assert_eq!(message, "Unauthorized"),
        other => panic!("expected BackendApi, got {:?}", other),
    }
}

#[test]
fn test_backend_error_wins_over_hits() {
    let mut body: serde_json::Value =
        serde_json::from_str(&backend_response(vec![package_hit("hello", "a.nix:1")])).unwrap();
    body["error"] = json!({"type": "search_phase_execution_exception"});

    let result = test_engine(false).response(&body.to_string());
    assert!(matches!(result, Err(SearchError::BackendApi { .. })));
}

#[test]
fn test_metadata_toggle() {
    let hits = vec![
        package_hit("a", "pkgs/a.nix:1"),
        package_hit("b", "pkgs/b.nix:2"),
    ];
    let body = backend_response(hits);

    let without = test_engine(false).response(&body).unwrap();
    assert!(without.iter().all(|r| r.metadata.is_none()));
    for result in &without {
        let json = serde_json::to_value(result).unwrap();
        assert!(json.get("metadata").is_none());
    }

    let with = test_engine(true).response(&body).unwrap();
    assert!(with.iter().all(|r| r.metadata.is_some()));
    let metadata = with[1].metadata.as_ref().unwrap();
    assert_eq!(metadata.index, "latest-42-nixos-unstable");
    assert_eq!(metadata.id, "id-b");
    assert_eq!(metadata.score, Some(12.5));
}

#[test]
fn test_package_url_is_encoded() {
    let hit = package_hit("python3Packages.a&b", "pkgs/a.nix:1");

    let results = test_engine(false).response(&backend_response(vec![hit])).unwrap();
    assert_eq!(
        results[0].url,
        "https://search.nixos.org/packages?channel=unstable&show=python3Packages.a%26b"
    );
}

#[test]
fn test_wrong_field_type_is_malformed() {
    let cases = [
        ("package_homepage", json!("https://x"), "\"https://x\""),
        ("package_pversion", json!(1), "1"),
        ("package_programs", json!([null]), "[null]"),
    ];

    for (name, value, shown) in cases {
        let mut bad = package_hit("bad", "pkgs/bad.nix:1");
        bad["_source"][name] = value;
        let hits = vec![bad, package_hit("ok", "pkgs/ok.nix:1")];

        match test_engine(false).response(&backend_response(hits)) {
            Err(SearchError::MalformedField { field, value, .. }) => {
                assert_eq!(field, name);
                assert_eq!(value, shown);
            }
            other => panic!("{}: expected MalformedField, got {:?}", name, other),
        }
    }
}

#[test]
fn test_non_json_body_is_invalid_response() {
    let result = test_engine(false).response("upstream connect error");
    assert!(matches!(result, Err(SearchError::InvalidResponse { .. })));
}
