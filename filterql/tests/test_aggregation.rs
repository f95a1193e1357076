mod common;

use common::{sample_documents, test_schema, MemoryIndex};
use filterql::{AggregationSpec, FilterSpec, RetrievalConfig, Retriever};
use serde_json::json;

fn retriever() -> Retriever<MemoryIndex> {
    Retriever::new(MemoryIndex::new(sample_documents()), RetrievalConfig::default())
}

#[tokio::test]
async fn terms_aggregation_counts_per_bucket() {
    let r = retriever();
    let spec = FilterSpec::from_json("{}").unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "terms".to_string(),
        field_name: "category".to_string(),
        ..Default::default()
    };

    let result = r
        .aggregate(&spec, &aggregation, &test_schema())
        .await
        .unwrap()
        .expect("terms aggregation result");

    assert_eq!(result.get("A"), Some(&json!(3)));
    assert_eq!(result.get("B"), Some(&json!(5)));
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn aggregation_respects_the_filter() {
    let r = retriever();
    let spec = FilterSpec::from_json(r#"{ "and": [ { "status": "inactive" } ] }"#).unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "terms".to_string(),
        field_name: "category".to_string(),
        ..Default::default()
    };

    let result = r
        .aggregate(&spec, &aggregation, &test_schema())
        .await
        .unwrap()
        .expect("terms aggregation result");

    assert_eq!(result.get("B"), Some(&json!(3)));
    assert_eq!(result.get("A"), None);
}

#[tokio::test]
async fn terms_include_list_limits_buckets() {
    let r = retriever();
    let spec = FilterSpec::from_json("{}").unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "terms".to_string(),
        field_name: "category".to_string(),
        values: Some(r#"["A"]"#.to_string()),
        ..Default::default()
    };

    let result = r
        .aggregate(&spec, &aggregation, &test_schema())
        .await
        .unwrap()
        .expect("terms aggregation result");

    assert_eq!(result.get("A"), Some(&json!(3)));
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn metric_aggregation_flattens_to_a_single_value() {
    let r = retriever();
    let spec = FilterSpec::from_json("{}").unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "avg".to_string(),
        field_name: "price".to_string(),
        ..Default::default()
    };

    let result = r
        .aggregate(&spec, &aggregation, &test_schema())
        .await
        .unwrap()
        .expect("avg aggregation result");

    // mean of 10..=80 step 10
    assert_eq!(result.get("avg_price"), Some(&json!("45")));
}

#[tokio::test]
async fn unknown_aggregation_type_yields_nothing() {
    let r = retriever();
    let spec = FilterSpec::from_json("{}").unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "cardinality".to_string(),
        field_name: "category".to_string(),
        ..Default::default()
    };

    let result = r.aggregate(&spec, &aggregation, &test_schema()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn blank_field_name_yields_nothing() {
    let r = retriever();
    let spec = FilterSpec::from_json("{}").unwrap();
    let aggregation = AggregationSpec {
        aggre_type: "terms".to_string(),
        field_name: String::new(),
        ..Default::default()
    };

    let result = r.aggregate(&spec, &aggregation, &test_schema()).await.unwrap();
    assert!(result.is_none());
}
