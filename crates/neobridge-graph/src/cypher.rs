//! Cypher generation for the structural operations.
//!
//! The builder is the only place query text is assembled. Labels and
//! property keys are interpolated only after passing the identifier check;
//! every user-supplied value is emitted as a bound parameter, never
//! concatenated into the text.

use serde_json::{Map, Value};

use neobridge_core::ToolError;

/// Default row cap for `find_nodes` when the caller supplies no limit.
pub const DEFAULT_FIND_LIMIT: i64 = 100;

/// Hard row cap for `find_nodes`. Requested limits above this are clamped,
/// not rejected, to protect the store from unbounded scans.
pub const MAX_FIND_LIMIT: i64 = 1000;

/// A parameterized statement ready for execution: query text plus the
/// parameter map that accompanies it. Pure data, so builder output is
/// directly assertable in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub text: String,
    pub params: Vec<(String, Value)>,
}

/// Build the `CREATE` statement for `create_node`.
///
/// Labels must be non-empty and each label a valid identifier. The property
/// map travels as the single `$props` parameter.
pub fn create_node(labels: &[String], properties: &Map<String, Value>) -> Result<BuiltQuery, ToolError> {
    if labels.is_empty() {
        return Err(ToolError::InvalidLabel(
            "at least one label is required".to_string(),
        ));
    }
    for label in labels {
        check_identifier(label)?;
    }
    for key in properties.keys() {
        check_identifier(key)?;
    }

    let label_part = labels.join(":");
    Ok(BuiltQuery {
        text: format!("CREATE (n:{label_part}) SET n = $props RETURN n"),
        params: vec![("props".to_string(), Value::Object(properties.clone()))],
    })
}

/// Build the `MATCH` statement for `find_nodes`.
///
/// An absent label matches any label; properties become equality filters
/// with positional parameters; the limit is clamped to [`MAX_FIND_LIMIT`].
pub fn find_nodes(
    label: Option<&str>,
    properties: &Map<String, Value>,
    limit: Option<i64>,
) -> Result<BuiltQuery, ToolError> {
    let match_part = match label {
        Some(label) => {
            check_identifier(label)?;
            format!("MATCH (n:{label})")
        }
        None => "MATCH (n)".to_string(),
    };

    let mut filters = Vec::with_capacity(properties.len());
    let mut params: Vec<(String, Value)> = Vec::with_capacity(properties.len() + 1);
    for (i, (key, value)) in properties.iter().enumerate() {
        check_identifier(key)?;
        let param = format!("p{i}");
        filters.push(format!("n.{key} = ${param}"));
        params.push((param, value.clone()));
    }

    let where_part = if filters.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", filters.join(" AND "))
    };

    let limit = limit.unwrap_or(DEFAULT_FIND_LIMIT).min(MAX_FIND_LIMIT);
    params.push(("limit".to_string(), Value::from(limit)));

    Ok(BuiltQuery {
        text: format!("{match_part}{where_part} RETURN n LIMIT $limit"),
        params,
    })
}

/// The fixed introspection statements behind `get_schema`, in execution
/// order: labels, relationship types, property keys, node count,
/// relationship count. Each returns exactly one row with one column named
/// after the value it carries.
pub fn schema_statements() -> [&'static str; 5] {
    [
        "CALL db.labels() YIELD label RETURN collect(label) AS labels",
        "CALL db.relationshipTypes() YIELD relationshipType \
         RETURN collect(relationshipType) AS relationship_types",
        "CALL db.propertyKeys() YIELD propertyKey RETURN collect(propertyKey) AS property_keys",
        "MATCH (n) RETURN count(n) AS node_count",
        "MATCH ()-[r]->() RETURN count(r) AS relationship_count",
    ]
}

/// Labels and property keys must look like identifiers before they are
/// allowed anywhere near query text: letters, digits, underscore, not
/// starting with a digit.
fn check_identifier(s: &str) -> Result<(), ToolError> {
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ToolError::InvalidLabel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn create_node_binds_properties_as_one_parameter() {
        let built = create_node(
            &["Person".to_string()],
            &props(&[("name", json!("Alice")), ("age", json!(30))]),
        )
        .unwrap();

        assert_eq!(built.text, "CREATE (n:Person) SET n = $props RETURN n");
        assert_eq!(built.params.len(), 1);
        assert_eq!(built.params[0].0, "props");
        assert_eq!(built.params[0].1["name"], "Alice");
    }

    #[test]
    fn create_node_joins_multiple_labels() {
        let built = create_node(
            &["Person".to_string(), "Employee".to_string()],
            &Map::new(),
        )
        .unwrap();
        assert_eq!(built.text, "CREATE (n:Person:Employee) SET n = $props RETURN n");
    }

    #[test]
    fn create_node_requires_a_label() {
        let err = create_node(&[], &Map::new()).unwrap_err();
        assert_eq!(err.kind(), "invalid_label");
    }

    #[test]
    fn create_node_rejects_malformed_labels() {
        for bad in ["9Person", "Per son", "Person) DETACH DELETE n //", ""] {
            let err = create_node(&[bad.to_string()], &Map::new()).unwrap_err();
            assert_eq!(err.kind(), "invalid_label", "label {bad:?} was accepted");
        }
    }

    #[test]
    fn create_node_rejects_malformed_property_keys() {
        let err = create_node(
            &["Person".to_string()],
            &props(&[("na me", json!("Alice"))]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_label");
    }

    #[test]
    fn find_nodes_without_label_matches_any() {
        let built = find_nodes(None, &Map::new(), None).unwrap();
        assert_eq!(built.text, "MATCH (n) RETURN n LIMIT $limit");
        assert_eq!(built.params, vec![("limit".to_string(), json!(DEFAULT_FIND_LIMIT))]);
    }

    #[test]
    fn find_nodes_filters_are_parameterized() {
        let built = find_nodes(
            Some("Person"),
            &props(&[("name", json!("Alice")), ("city", json!("Berlin"))]),
            Some(10),
        )
        .unwrap();

        assert_eq!(
            built.text,
            "MATCH (n:Person) WHERE n.name = $p0 AND n.city = $p1 RETURN n LIMIT $limit"
        );
        assert_eq!(built.params[0], ("p0".to_string(), json!("Alice")));
        assert_eq!(built.params[1], ("p1".to_string(), json!("Berlin")));
        assert_eq!(built.params[2], ("limit".to_string(), json!(10)));
    }

    #[test]
    fn find_nodes_clamps_limit_to_maximum() {
        let built = find_nodes(None, &Map::new(), Some(5000)).unwrap();
        assert_eq!(built.params[0], ("limit".to_string(), json!(MAX_FIND_LIMIT)));
    }

    #[test]
    fn find_nodes_rejects_malformed_label() {
        let err = find_nodes(Some("Person {x: 1}) RETURN n //"), &Map::new(), None).unwrap_err();
        assert_eq!(err.kind(), "invalid_label");
    }

    #[test]
    fn schema_statements_are_fixed() {
        let statements = schema_statements();
        assert_eq!(statements.len(), 5);
        assert!(statements[0].contains("db.labels"));
        assert!(statements[4].contains("count(r)"));
    }

    #[test]
    fn underscore_identifiers_are_accepted() {
        assert!(check_identifier("_internal").is_ok());
        assert!(check_identifier("snake_case_2").is_ok());
    }
}
