// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nixpkgs package search engine
//!
//! Queries the Elasticsearch backend behind search.nixos.org. The backend
//! requires a credential and names its indices after a schema version that
//! is resolved once at load time (see [`super::index_version`]).

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::config::NixpkgsConfig;
use super::engine::SearchEngine;
use super::index_version::{
    resolve_index_version, HttpVersionSource, IndexVersion, VersionSource,
};
use super::query::{
    escape_wildcard, BoolQuery, DisMaxQuery, FieldBoost, MultiMatchQuery, MultiMatchType,
    Operator, PackageSort, Query, SearchBody,
};
use super::types::{EngineAbout, PackageResult, RequestParams, ResultMetadata, SearchError};

const GITHUB_BLOB_URL: &str = "https://github.com/NixOS/nixpkgs/blob/master";
const PACKAGES_URL: &str = "https://search.nixos.org/packages";

const TIE_BREAKER: f64 = 0.7;
/// Weight of the `field.*` subfields relative to the field itself
const SUBFIELD_BOOST: f64 = 0.6;
const WEIGHTED_FIELDS: &[(&str, f64)] = &[
    ("package_attr_name", 9.0),
    ("package_programs", 9.0),
    ("package_pname", 6.0),
    ("package_description", 1.3),
    ("package_longDescription", 1.0),
    ("flake_name", 0.5),
];

static ABOUT: EngineAbout = EngineAbout {
    website: "https://search.nixos.org",
    use_official_api: false,
    require_api_key: true,
    results: "JSON",
    template: "packages.html",
};

/// Nixpkgs search engine
pub struct NixpkgsEngine {
    index: String,
    search_url: String,
    packages_url: Url,
    channel: String,
    show_metadata: bool,
    page_size: u32,
    authorization: Option<HeaderValue>,
}

impl NixpkgsEngine {
    /// Resolve the index and create the engine
    ///
    /// An explicit `index` in the configuration is used as-is; otherwise the
    /// version is fetched once from `source`. No engine is returned if
    /// resolution fails.
    pub async fn initialize(
        config: &NixpkgsConfig,
        source: &dyn VersionSource,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let index = match &config.index {
            Some(index) => index.clone(),
            None => resolve_index_version(source, config.version_timeout())
                .await?
                .index_name(&config.channel),
        };

        Self::with_index(config, index)
    }

    /// Resolve the index version over HTTP and create the engine
    pub async fn from_config(config: &NixpkgsConfig) -> Result<Self, SearchError> {
        let source = HttpVersionSource::new(&config.version_url, config.version_timeout())?;
        Self::initialize(config, &source).await
    }

    /// Create the engine from an already resolved version
    pub fn new(config: &NixpkgsConfig, version: &IndexVersion) -> Result<Self, SearchError> {
        config.validate()?;
        Self::with_index(config, version.index_name(&config.channel))
    }

    fn with_index(config: &NixpkgsConfig, index: String) -> Result<Self, SearchError> {
        let search_url = format!("{}/{}/_search", config.base_url.trim_end_matches('/'), index);
        let packages_url = Url::parse(PACKAGES_URL).map_err(|e| SearchError::Config {
            reason: e.to_string(),
        })?;

        let authorization = config.authorization_header()?;
        if authorization.is_none() {
            warn!("No authorization configured for nixpkgs backend");
        }

        debug!("Nixpkgs engine ready: {}", search_url);

        Ok(Self {
            index,
            search_url,
            packages_url,
            channel: config.channel.clone(),
            show_metadata: config.show_metadata,
            page_size: config.page_size,
            authorization,
        })
    }

    /// Name of the index being searched
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Endpoint requests are sent to
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    fn build_query(&self, query: &str, pageno: u32) -> SearchBody {
        let fields = WEIGHTED_FIELDS
            .iter()
            .flat_map(|&(field, boost)| {
                [
                    FieldBoost::new(field, boost),
                    FieldBoost::new(format!("{}.*", field), boost * SUBFIELD_BOOST),
                ]
            })
            .collect();

        let terms: Vec<&str> = query.split_whitespace().collect();
        let multi_match = Query::MultiMatch(MultiMatchQuery {
            kind: MultiMatchType::CrossFields,
            query: query.to_string(),
            analyzer: "whitespace".to_string(),
            auto_generate_synonyms_phrase_query: false,
            operator: Operator::And,
            name: format!("multi_match_{}", terms.join("_")),
            fields,
        });

        let wildcard = Query::wildcard(
            "package_attr_name",
            format!("*{}*", escape_wildcard(query)),
            true,
        );

        SearchBody {
            from: pageno.saturating_sub(1).saturating_mul(self.page_size),
            size: self.page_size,
            sort: vec![PackageSort::default()],
            query: Query::Bool(BoolQuery {
                must: vec![Query::DisMax(DisMaxQuery {
                    tie_breaker: TIE_BREAKER,
                    queries: vec![multi_match, wildcard],
                })],
            }),
        }
    }

    fn normalize(&self, hit: &Map<String, Value>) -> Result<PackageResult, SearchError> {
        let source = PackageSource::decode(&field::<Map<String, Value>>(hit, "_source")?)?;

        let source_code_url = match source.package_position.as_deref() {
            Some(position) => position_to_source_url(position)?,
            None => String::new(),
        };

        let mut url = self.packages_url.clone();
        url.query_pairs_mut()
            .append_pair("channel", &self.channel)
            .append_pair("show", &source.package_attr_name);

        let metadata = if self.show_metadata {
            Some(ResultMetadata {
                index: field(hit, "_index")?,
                id: field(hit, "_id")?,
                score: field(hit, "_score")?,
            })
        } else {
            None
        };

        Ok(PackageResult {
            title: source.package_attr_name,
            package_name: source.package_pname,
            version: source.package_pversion,
            content: source.package_description,
            source_code_url,
            url: url.to_string(),
            maintainer: source.package_maintainers_set.join(", "),
            tags: source.package_programs,
            license_name: source.package_license_set.join(", "),
            homepage: source.package_homepage.into_iter().next(),
            metadata,
        })
    }
}

impl SearchEngine for NixpkgsEngine {
    fn name(&self) -> &'static str {
        "nixpkgs"
    }

    fn about(&self) -> &EngineAbout {
        &ABOUT
    }

    fn categories(&self) -> &'static [&'static str] {
        &["it", "packages"]
    }

    fn request(
        &self,
        query: &str,
        mut params: RequestParams,
    ) -> Result<RequestParams, SearchError> {
        let body = self.build_query(query, params.pageno);

        params.method = Method::POST;
        params.url = self.search_url.clone();
        params.body = serde_json::to_string(&body).map_err(|e| SearchError::InvalidRequest {
            reason: e.to_string(),
        })?;
        params
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(authorization) = &self.authorization {
            params.headers.insert(AUTHORIZATION, authorization.clone());
        }

        debug!("Built nixpkgs request for page {}", params.pageno);
        Ok(params)
    }

    fn response(&self, body: &str) -> Result<Vec<PackageResult>, SearchError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| SearchError::InvalidResponse {
                reason: e.to_string(),
            })?;

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let message = match error {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            warn!("Nixpkgs backend returned an error: {}", message);
            return Err(SearchError::BackendApi { message });
        }

        let response: BackendResponse =
            serde_json::from_value(value).map_err(|e| SearchError::InvalidResponse {
                reason: e.to_string(),
            })?;

        debug!("Nixpkgs backend returned {} hits", response.hits.hits.len());

        response
            .hits
            .hits
            .iter()
            .map(|hit| self.normalize(hit))
            .collect()
    }
}

/// Turn a `path:line` position into a link to the nixpkgs source
fn position_to_source_url(position: &str) -> Result<String, SearchError> {
    let malformed = |reason: &str| SearchError::MalformedField {
        field: "package_position".to_string(),
        value: position.to_string(),
        reason: reason.to_string(),
    };

    let (path, line) = position
        .split_once(':')
        .filter(|(_, line)| !line.contains(':'))
        .ok_or_else(|| malformed("expected exactly one ':' separator"))?;

    if path.is_empty() {
        return Err(malformed("path is empty"));
    }
    let line: u32 = line
        .parse()
        .map_err(|_| malformed("line is not a valid line number"))?;

    Ok(format!("{}/{}#L{}", GITHUB_BLOB_URL, path, line))
}

/// Treat JSON `null` like an absent field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode one field of a hit
///
/// Absent and `null` fields take their default. A present value of the
/// wrong shape is reported against that field alone.
fn field<T>(object: &Map<String, Value>, name: &str) -> Result<T, SearchError>
where
    T: Default + DeserializeOwned,
{
    match object.get(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|e| SearchError::MalformedField {
            field: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct BackendResponse {
    #[serde(default, deserialize_with = "nullable")]
    hits: HitsEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default, deserialize_with = "nullable")]
    hits: Vec<Map<String, Value>>,
}

#[derive(Debug, Default)]
struct PackageSource {
    package_attr_name: String,
    package_pname: String,
    package_pversion: String,
    package_description: String,
    package_position: Option<String>,
    package_maintainers_set: Vec<String>,
    package_programs: Vec<String>,
    package_license_set: Vec<String>,
    package_homepage: Vec<String>,
}

impl PackageSource {
    fn decode(source: &Map<String, Value>) -> Result<Self, SearchError> {
        Ok(Self {
            package_attr_name: field(source, "package_attr_name")?,
            package_pname: field(source, "package_pname")?,
            package_pversion: field(source, "package_pversion")?,
            package_description: field(source, "package_description")?,
            package_position: field(source, "package_position")?,
            package_maintainers_set: field(source, "package_maintainers_set")?,
            package_programs: field(source, "package_programs")?,
            package_license_set: field(source, "package_license_set")?,
            package_homepage: field(source, "package_homepage")?,
        })
    }
}
