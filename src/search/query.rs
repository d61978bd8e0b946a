// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Typed subset of the Elasticsearch query DSL
//!
//! Queries are assembled from plain structs and serialized with serde, so
//! user-supplied text only ever lands in string values of the payload.

use std::collections::BTreeMap;

use serde::ser::Serializer;
use serde::Serialize;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Desc,
}

/// Top-level `_search` request body
#[derive(Debug, Clone, Serialize)]
pub struct SearchBody {
    pub from: u32,
    pub size: u32,
    pub sort: Vec<PackageSort>,
    pub query: Query,
}

/// Ordering used by the package index: relevance, then attribute, then version
#[derive(Debug, Clone, Serialize)]
pub struct PackageSort {
    #[serde(rename = "_score")]
    pub score: Direction,
    pub package_attr_name: Direction,
    pub package_pversion: Direction,
}

impl Default for PackageSort {
    fn default() -> Self {
        Self {
            score: Direction::Desc,
            package_attr_name: Direction::Desc,
            package_pversion: Direction::Desc,
        }
    }
}

/// Query clause, serialized in the externally tagged form ES expects
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Bool(BoolQuery),
    DisMax(DisMaxQuery),
    MultiMatch(MultiMatchQuery),
    Wildcard(BTreeMap<String, WildcardTerm>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisMaxQuery {
    pub tie_breaker: f64,
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchType {
    CrossFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiMatchQuery {
    #[serde(rename = "type")]
    pub kind: MultiMatchType,
    pub query: String,
    pub analyzer: String,
    pub auto_generate_synonyms_phrase_query: bool,
    pub operator: Operator,
    #[serde(rename = "_name")]
    pub name: String,
    pub fields: Vec<FieldBoost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WildcardTerm {
    pub value: String,
    pub case_insensitive: bool,
}

/// A field name with its boost, serialized as `field^boost`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoost {
    pub field: String,
    pub boost: f64,
}

impl FieldBoost {
    pub fn new(field: impl Into<String>, boost: f64) -> Self {
        Self {
            field: field.into(),
            boost,
        }
    }
}

impl Serialize for FieldBoost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}^{}", self.field, self.boost))
    }
}

impl Query {
    /// Single-field wildcard clause
    pub fn wildcard(field: &str, value: String, case_insensitive: bool) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(
            field.to_string(),
            WildcardTerm {
                value,
                case_insensitive,
            },
        );
        Query::Wildcard(terms)
    }
}

/// Escape wildcard metacharacters so the text matches literally
pub fn escape_wildcard(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '?') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
