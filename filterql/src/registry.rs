use crate::errors::SearchError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Searchable schema metadata: which index backs it and which fields it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub name: String,
    pub index: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>, index: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            index: index.into(),
            fields,
        }
    }
}

/// Registry mapping schema identifiers to descriptors.
///
/// Populated at startup from code or a JSON config document; replaces any
/// runtime type discovery. Lookup by the same string identifier callers put
/// in their requests.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, SchemaDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: SchemaDescriptor) {
        self.schemas.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.schemas.get(name)
    }

    /// Lookup that surfaces a structured error for unknown identifiers.
    pub fn resolve(&self, name: &str) -> Result<&SchemaDescriptor, SearchError> {
        self.get(name)
            .ok_or_else(|| SearchError::SchemaNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Load a registry from a JSON config document of the form
    /// `{"Student": {"index": "students", "fields": ["name", ...]}, ...}`.
    pub fn from_json(config: &str) -> Result<Self, SearchError> {
        let doc: IndexMap<String, JsonValue> = serde_json::from_str(config)?;
        let mut registry = Self::new();
        for (name, body) in doc {
            let index = body
                .get("index")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| {
                    SearchError::ParseError(format!("schema '{}' is missing an index name", name))
                })?
                .to_string();
            let fields = match body.get("fields") {
                Some(fields) => serde_json::from_value(fields.clone())?,
                None => Vec::new(),
            };
            registry.register(SchemaDescriptor {
                name,
                index,
                fields,
            });
        }
        Ok(registry)
    }
}

/// Extract the flattened, dotted field-name list out of an index `mappings`
/// document by walking its nested `properties` objects.
pub fn fields_from_mappings(mappings: &JsonValue) -> Vec<String> {
    let mut fields = Vec::new();
    find_properties(None, mappings, &mut fields);
    fields
}

fn find_properties(parent: Option<&str>, node: &JsonValue, out: &mut Vec<String>) {
    let Some(map) = node.as_object() else {
        return;
    };
    for (key, value) in map {
        if key == "properties" {
            add_fields(parent, value, out);
        } else {
            find_properties(parent, value, out);
        }
    }
}

fn add_fields(parent: Option<&str>, properties: &JsonValue, out: &mut Vec<String>) {
    let Some(map) = properties.as_object() else {
        return;
    };
    for (field, body) in map {
        let qualified = match parent {
            Some(parent) => format!("{}.{}", parent, field),
            None => field.clone(),
        };
        out.push(qualified.clone());
        if let Some(nested) = body.get("properties") {
            add_fields(Some(&qualified), nested, out);
        }
    }
}
