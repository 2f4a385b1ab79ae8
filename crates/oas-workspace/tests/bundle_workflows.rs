//! Bundling workflows over a mocked resource universe.

use async_trait::async_trait;
use oas_json::short_hash;
use oas_workspace::bundle::{bundle, BundleConfig, LoadError, Loader};
use oas_workspace::rebase::parse_document_body;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Serves raw bodies (JSON or YAML text) keyed by absolute target,
/// parsing them the way a real transport loader would.
struct BodyLoader {
    bodies: HashMap<String, String>,
}

impl BodyLoader {
    fn new(bodies: &[(&str, &str)]) -> Self {
        BodyLoader {
            bodies: bodies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Loader for BodyLoader {
    fn validate(&self, target: &str) -> bool {
        target.starts_with("http://") || target.starts_with("https://")
    }

    async fn load(&self, target: &str) -> Result<Value, LoadError> {
        let body = self
            .bodies
            .get(target)
            .ok_or_else(|| LoadError::Fetch(format!("{target}: not found")))?;
        parse_document_body(body).map_err(LoadError::Parse)
    }
}

fn cfg(bodies: &[(&str, &str)]) -> BundleConfig {
    BundleConfig::new(vec![Box::new(BodyLoader::new(bodies))])
}

#[tokio::test]
async fn bundles_a_multi_resource_openapi_document() {
    let base = "http://specs.example.com";
    let user_schema = r#"{
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "address": {"$ref": "./address.json#"}
        }
    }"#;
    let address_schema = r#"{"type": "object", "properties": {"street": {"type": "string"}}}"#;

    let mut doc = json!({
        "openapi": "3.1.1",
        "info": {"title": "API", "version": "1.0.0"},
        "paths": {
            "/users": {
                "get": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": format!("{base}/schemas/user.json#"),
                                    },
                                },
                            },
                        },
                    },
                },
            },
        },
    });

    let report = bundle(
        &mut doc,
        &cfg(&[
            (&format!("{base}/schemas/user.json"), user_schema),
            (&format!("{base}/schemas/address.json"), address_schema),
        ]),
    )
    .await;

    assert!(report.warnings.is_empty());
    let user_key = short_hash(&format!("{base}/schemas/user.json"));
    let address_key = short_hash(&format!("{base}/schemas/address.json"));

    let schema_ref =
        &doc["paths"]["/users"]["get"]["responses"]["200"]["content"]["application/json"]["schema"]["$ref"];
    assert_eq!(schema_ref, &json!(format!("#/x-ext/{user_key}")));

    // The user schema's relative ref resolved against its own origin.
    assert_eq!(
        doc["x-ext"][&user_key]["properties"]["address"]["$ref"],
        json!(format!("#/x-ext/{address_key}"))
    );
    assert_eq!(
        doc["x-ext"][&address_key]["properties"]["street"]["type"],
        json!("string")
    );

    // The reverse-lookup map covers both resources.
    assert_eq!(
        doc["x-ext-urls"][&user_key],
        json!(format!("{base}/schemas/user.json"))
    );
    assert_eq!(
        doc["x-ext-urls"][&address_key],
        json!(format!("{base}/schemas/address.json"))
    );
}

#[tokio::test]
async fn bundles_yaml_resources() {
    let url = "http://specs.example.com/pet.yaml";
    let yaml_body = "type: object\nproperties:\n  name:\n    type: string\n";

    let mut doc = json!({"components": {"schemas": {"Pet": {"$ref": format!("{url}#")}}}});
    let report = bundle(&mut doc, &cfg(&[(url, yaml_body)])).await;

    assert!(report.warnings.is_empty());
    let key = short_hash(url);
    assert_eq!(
        doc["x-ext"][&key],
        json!({"type": "object", "properties": {"name": {"type": "string"}}})
    );
}

#[tokio::test]
async fn mixed_success_and_failure_bundles_what_it_can() {
    let good = "http://specs.example.com/good.json";
    let mut doc = json!({
        "a": {"$ref": format!("{good}#")},
        "b": {"$ref": "http://specs.example.com/gone.json#"},
        "c": {"$ref": "#/a"},
    });

    let report = bundle(&mut doc, &cfg(&[(good, r#"{"ok": true}"#)])).await;

    let key = short_hash(good);
    assert_eq!(doc["a"]["$ref"], json!(format!("#/x-ext/{key}")));
    // The broken reference is an unresolved marker, not an error.
    assert_eq!(
        doc["b"]["$ref"],
        json!("http://specs.example.com/gone.json#")
    );
    // Internal refs stay untouched.
    assert_eq!(doc["c"]["$ref"], json!("#/a"));

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0].reference,
        "http://specs.example.com/gone.json"
    );
}

#[tokio::test]
async fn malformed_remote_body_is_a_parse_warning() {
    let url = "http://specs.example.com/broken.json";
    let mut doc = json!({"a": {"$ref": format!("{url}#")}});

    let report = bundle(&mut doc, &cfg(&[(url, "{{{{ neither json nor yaml")])).await;

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0].error, LoadError::Parse(_)));
    assert_eq!(doc["a"]["$ref"], json!(format!("{url}#")));
}

#[tokio::test]
async fn bundled_document_rebases_like_any_other() {
    // Bundle, store, then rebase the bundled document against a remote
    // update of the same bundled shape.
    let url = "http://specs.example.com/user.json";
    let mut doc = json!({
        "openapi": "3.1.1",
        "info": {"title": "API", "version": "1.0.0"},
        "components": {"schemas": {"User": {"$ref": format!("{url}#")}}},
    });
    bundle(&mut doc, &cfg(&[(url, r#"{"type": "object"}"#)])).await;

    let mut ws = oas_workspace::Workspace::new();
    ws.add_document("default", doc.clone()).unwrap();

    let mut remote = doc;
    remote["info"]["title"] = json!("Renamed upstream");

    let conflicts = ws.rebase_document("default", &remote).unwrap();
    assert!(conflicts.is_empty());
    assert_eq!(
        ws.document("default").unwrap().content()["info"]["title"],
        json!("Renamed upstream")
    );
    // The bundled section survived the rebase untouched.
    let key = short_hash(url);
    assert_eq!(
        ws.document("default").unwrap().content()["x-ext"][&key],
        json!({"type": "object"})
    );
}
