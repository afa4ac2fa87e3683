//! `runQuery` / `runAggregationQuery` request bodies.

use serde::{Deserialize, Serialize};

use super::documents::Document;
use super::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter {
    field_filter: FieldFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct FieldFilter {
    field: FieldReference,
    op: &'static str,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Order {
    field: FieldReference,
    direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

impl StructuredQuery {
    /// All documents of one top-level collection.
    pub fn collection(collection: &str) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
            }],
            filter: None,
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// Restricts to documents whose `field` equals `value`. One filter per
    /// query; a later call replaces an earlier one.
    pub fn where_eq(mut self, field: &str, value: Value) -> Self {
        self.filter = Some(Filter {
            field_filter: FieldFilter {
                field: FieldReference {
                    field_path: field.to_string(),
                },
                op: "EQUAL",
                value,
            },
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(Order {
            field: FieldReference {
                field_path: field.to_string(),
            },
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = (offset > 0).then_some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest<'a> {
    pub structured_query: &'a StructuredQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<&'a str>,
}

/// One element of the streamed `runQuery` response array. Elements without a
/// document only carry progress information.
#[derive(Debug, Deserialize)]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
}

/// Alias under which the count aggregation is returned.
pub const COUNT_ALIAS: &str = "total";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationRequest<'a> {
    pub structured_aggregation_query: AggregationQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationQuery<'a> {
    pub structured_query: &'a StructuredQuery,
    pub aggregations: Vec<Aggregation>,
}

#[derive(Debug, Serialize)]
pub struct Aggregation {
    pub alias: &'static str,
    pub count: serde_json::Map<String, serde_json::Value>,
}

impl<'a> RunAggregationRequest<'a> {
    pub fn count(query: &'a StructuredQuery) -> Self {
        Self {
            structured_aggregation_query: AggregationQuery {
                structured_query: query,
                aggregations: vec![Aggregation {
                    alias: COUNT_ALIAS,
                    count: serde_json::Map::new(),
                }],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunAggregationItem {
    #[serde(default)]
    pub result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(default)]
    pub aggregate_fields: super::value::Fields,
}
