use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use docdir_atoms::store::{Document, DocumentStore, Record};
use docdir_atoms::StoreError;
use serde_json::{Number, Value};

type Item = HashMap<String, AttributeValue>;

/// Single-table document store: `PK = <COLLECTION>`, `SK = <COLLECTION>#<id>`.
#[derive(Debug, Clone)]
pub struct DynamoDocumentStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoDocumentStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn partition_key(collection: &str) -> String {
    collection.to_uppercase()
}

fn sort_key(collection: &str, id: &str) -> String {
    format!("{}#{}", partition_key(collection), id)
}

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

fn number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        Value::Number(i.into())
    } else if let Ok(u) = n.parse::<u64>() {
        Value::Number(u.into())
    } else {
        n.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

pub fn from_attribute(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_attribute(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number(n)).collect()),
        _ => Value::Null,
    }
}

fn item_to_document(mut item: Item) -> Document {
    item.remove("PK");
    item.remove("SK");
    item.iter().map(|(k, v)| (k.clone(), from_attribute(v))).collect()
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn write(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> Result<String, StoreError> {
        let id = id.map(str::to_string).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut item: Item = document.iter().map(|(k, v)| (k.clone(), to_attribute(v))).collect();
        item.insert("PK".to_string(), AttributeValue::S(partition_key(collection)));
        item.insert("SK".to_string(), AttributeValue::S(sort_key(collection, &id)));

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| StoreError::backend("DynamoDB put_item", DisplayErrorContext(&e)))?;

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        if partial.is_empty() {
            return match self.get(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::not_found(collection, id)),
            };
        }

        let mut update_expr = Vec::with_capacity(partial.len());
        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(partition_key(collection)))
            .key("SK", AttributeValue::S(sort_key(collection, id)))
            .condition_expression("attribute_exists(PK)");

        for (i, (field, value)) in partial.iter().enumerate() {
            update_expr.push(format!("#f{i} = :v{i}"));
            builder = builder
                .expression_attribute_names(format!("#f{i}"), field)
                .expression_attribute_values(format!(":v{i}"), to_attribute(value));
        }

        builder
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception());
                if missing == Some(true) {
                    StoreError::not_found(collection, id)
                } else {
                    StoreError::backend("DynamoDB update_item", DisplayErrorContext(&e))
                }
            })?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(partition_key(collection)))
            .key("SK", AttributeValue::S(sort_key(collection, id)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception());
                if missing == Some(true) {
                    StoreError::not_found(collection, id)
                } else {
                    StoreError::backend("DynamoDB delete_item", DisplayErrorContext(&e))
                }
            })?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(partition_key(collection)))
            .key("SK", AttributeValue::S(sort_key(collection, id)))
            .send()
            .await
            .map_err(|e| StoreError::backend("DynamoDB get_item", DisplayErrorContext(&e)))?;

        Ok(result.item.map(item_to_document))
    }

    async fn query_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let pk = partition_key(collection);
        let sk_prefix = format!("{}#", pk);
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(pk.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::backend("DynamoDB query", DisplayErrorContext(&e)))?;

            for item in result.items() {
                let id = item
                    .get("SK")
                    .and_then(|v| v.as_s().ok())
                    .and_then(|sk| sk.strip_prefix(&sk_prefix))
                    .map(|s| s.to_string());
                match id {
                    Some(id) => records.push(Record {
                        id,
                        document: item_to_document(item.clone()),
                    }),
                    None => tracing::warn!(collection, "skipping item without a sort key"),
                }
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_follow_single_table_layout() {
        assert_eq!(partition_key("doctors"), "DOCTORS");
        assert_eq!(sort_key("doctors", "abc"), "DOCTORS#abc");
    }

    #[test]
    fn nested_documents_survive_the_attribute_mapping() {
        let value = json!({
            "name": "Dr. Rao",
            "clinics": [{"name": "Main", "latitude": "12.9"}],
            "fileUrls": {"photograph": ["https://x/a.png"]},
            "count": 3,
            "ratio": 0.5,
            "active": true,
            "note": null
        });
        assert_eq!(from_attribute(&to_attribute(&value)), value);
    }

    #[test]
    fn numbers_map_to_n() {
        assert_eq!(to_attribute(&json!(42)), AttributeValue::N("42".into()));
        assert_eq!(from_attribute(&AttributeValue::N("-7".into())), json!(-7));
        assert_eq!(from_attribute(&AttributeValue::N("1.25".into())), json!(1.25));
    }

    #[test]
    fn item_keys_are_stripped() {
        let mut item = Item::new();
        item.insert("PK".into(), AttributeValue::S("DOCTORS".into()));
        item.insert("SK".into(), AttributeValue::S("DOCTORS#1".into()));
        item.insert("name".into(), AttributeValue::S("A".into()));
        let doc = item_to_document(item);
        assert_eq!(Value::Object(doc), json!({"name": "A"}));
    }
}
