// Shared fixtures for the search tests

use nixpkgs_search::{IndexVersion, NixpkgsConfig, NixpkgsEngine};
use serde_json::{json, Value};

pub const TEST_AUTH: &str = "Basic dGVzdC11c2VyOnRlc3QtcGFzcw==";

pub fn test_config(show_metadata: bool) -> NixpkgsConfig {
    NixpkgsConfig {
        show_metadata,
        authorization: Some(TEST_AUTH.to_string()),
        ..NixpkgsConfig::default()
    }
}

pub fn test_engine(show_metadata: bool) -> NixpkgsEngine {
    let version = IndexVersion::parse("42", "test").unwrap();
    NixpkgsEngine::new(&test_config(show_metadata), &version).unwrap()
}

/// A backend hit with every field the engine reads
pub fn package_hit(attr_name: &str, position: &str) -> Value {
    json!({
        "_index": "latest-42-nixos-unstable",
        "_id": format!("id-{}", attr_name),
        "_score": 12.5,
        "_source": {
            "package_attr_name": attr_name,
            "package_pname": attr_name,
            "package_pversion": "1.0.0",
            "package_description": format!("The {} package", attr_name),
            "package_position": position,
            "package_maintainers_set": ["alice", "bob"],
            "package_programs": [attr_name],
            "package_license_set": ["MIT", "Apache-2.0"],
            "package_homepage": [format!("https://{}.example.org", attr_name), "https://mirror.example.org"]
        }
    })
}

pub fn backend_response(hits: Vec<Value>) -> String {
    json!({
        "took": 3,
        "timed_out": false,
        "hits": {
            "total": {"value": hits.len(), "relation": "eq"},
            "max_score": null,
            "hits": hits
        }
    })
    .to_string()
}
