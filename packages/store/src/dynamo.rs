//! `DynamoDB` implementation of the [`DocumentStore`] trait.
//!
//! One [`DynamoStore`] wraps one table and its string key attribute.
//! Records cross the boundary as JSON object maps; `DynamoDB`'s decimal
//! number strings are normalized to plain integers when exactly whole
//! and floats otherwise (recursively through maps and lists).
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `AWS_REGION` | Yes | Region of the `DynamoDB` tables |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | Yes | Credentials (the AWS SDK reads these automatically) |

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use disaster_map_models::{Record, value};
use serde_json::Value;

use crate::{ContinuationToken, DocumentStore, ScanFilter, ScanPage, StoreError};

/// Operation timeout for every `DynamoDB` call. Expiry surfaces as
/// [`StoreError::Unavailable`] rather than hanging the request.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// A single `DynamoDB` table exposed as a [`DocumentStore`].
#[derive(Clone)]
pub struct DynamoStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
    key_attr: String,
}

impl DynamoStore {
    /// Wraps an existing client around one table.
    #[must_use]
    pub fn new(client: aws_sdk_dynamodb::Client, table: &str, key_attr: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            key_attr: key_attr.to_string(),
        }
    }

    /// The table this store reads and writes.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Creates a `DynamoDB` client from the ambient AWS environment, with an
/// explicit per-operation timeout.
pub async fn client_from_env() -> aws_sdk_dynamodb::Client {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(OPERATION_TIMEOUT)
        .build();

    let config = aws_config::from_env().timeout_config(timeouts).load().await;
    aws_sdk_dynamodb::Client::new(&config)
}

#[async_trait]
impl DocumentStore for DynamoStore {
    async fn get_item(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(&self.key_attr, AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(store_error)?;

        Ok(output.item().map(item_to_record))
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record_to_item(&record)))
            .send()
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn update_item(
        &self,
        key: &str,
        field: &str,
        new_value: Value,
    ) -> Result<Record, StoreError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(&self.key_attr, AttributeValue::S(key.to_string()))
            .update_expression("SET #field = :value")
            .expression_attribute_names("#field", field)
            .expression_attribute_values(":value", json_to_attr(&new_value))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(store_error)?;

        Ok(output.attributes().map(item_to_record).unwrap_or_default())
    }

    async fn delete_item(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key(&self.key_attr, AttributeValue::S(key.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(store_error)?;

        Ok(output.attributes().map(item_to_record))
    }

    async fn scan(
        &self,
        filter: Option<&ScanFilter>,
        token: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let mut request = self.client.scan().table_name(&self.table);

        if let Some(filter) = filter {
            let (expression, names, values) = filter_expression(filter);
            request = request
                .filter_expression(expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values));
        }

        if let Some(token) = token {
            request = request.set_exclusive_start_key(Some(record_to_item(&token.0)));
        }

        let output = request.send().await.map_err(store_error)?;

        let records = output.items().iter().map(item_to_record).collect();
        let next_token = output
            .last_evaluated_key()
            .map(|key| ContinuationToken(item_to_record(key)));

        Ok(ScanPage {
            records,
            next_token,
        })
    }
}

/// Maps an SDK error: service-reported failures keep the store's own
/// message, everything else (dispatch, timeout, response parsing) is a
/// transport failure.
fn store_error<E>(err: SdkError<E>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(context) => {
            let service = context.err();
            StoreError::Operation {
                message: service
                    .message()
                    .map_or_else(|| service.to_string(), ToString::to_string),
            }
        }
        other => StoreError::Unavailable {
            message: other.to_string(),
        },
    }
}

/// Translates a [`ScanFilter`] into a `DynamoDB` filter expression with
/// attribute name/value placeholders.
fn filter_expression(
    filter: &ScanFilter,
) -> (
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
) {
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    let expression = match filter {
        ScanFilter::CoordinatesWithin(bbox) => {
            names.insert("#lat".to_string(), "lat".to_string());
            values.insert(":lat_min".to_string(), number_attr(bbox.lat_min));
            values.insert(":lat_max".to_string(), number_attr(bbox.lat_max));

            if bbox.unbounded_longitude() {
                "#lat BETWEEN :lat_min AND :lat_max".to_string()
            } else {
                names.insert("#lon".to_string(), "lon".to_string());
                values.insert(":lon_min".to_string(), number_attr(bbox.lon_min));
                values.insert(":lon_max".to_string(), number_attr(bbox.lon_max));
                "#lat BETWEEN :lat_min AND :lat_max AND #lon BETWEEN :lon_min AND :lon_max"
                    .to_string()
            }
        }
        ScanFilter::FieldEquals { field, value } => {
            names.insert("#field".to_string(), field.clone());
            values.insert(":value".to_string(), json_to_attr(value));
            "#field = :value".to_string()
        }
    };

    (expression, names, values)
}

fn number_attr(n: f64) -> AttributeValue {
    AttributeValue::N(n.to_string())
}

/// Converts a `DynamoDB` item to a JSON record, normalizing numbers.
fn item_to_record(item: &HashMap<String, AttributeValue>) -> Record {
    item.iter()
        .map(|(k, v)| (k.clone(), attr_to_json(v)))
        .collect()
}

/// Converts a JSON record to a `DynamoDB` item.
fn record_to_item(record: &Record) -> HashMap<String, AttributeValue> {
    record
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attr(v)))
        .collect()
}

/// Converts one attribute value to JSON.
///
/// Number strings go through [`value::parse_decimal`]: whole values
/// become integers, the rest floats, and unparseable number strings are
/// kept as strings rather than dropped.
fn attr_to_json(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::from(s.clone()),
        AttributeValue::N(n) => {
            value::parse_decimal(n).unwrap_or_else(|| Value::from(n.clone()))
        }
        AttributeValue::Bool(b) => Value::from(*b),
        AttributeValue::L(items) => Value::Array(items.iter().map(attr_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::from).collect())
        }
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| value::parse_decimal(n).unwrap_or_else(|| Value::from(n.clone())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// Converts a JSON value to its attribute value representation.
fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attr(v)))
                .collect(),
        ),
    }
}
