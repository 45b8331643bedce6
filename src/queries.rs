use graphql_parser::query::{Definition, OperationDefinition, Selection, SelectionSet, parse_query};
use serde_json::Value;

pub const ENTITY_ID_QUERY: &str = include_str!("../queries/entity_id.graphql");
pub const PROCESSES_QUERY: &str = include_str!("../queries/processes.graphql");
pub const DETAILS_QUERY: &str = include_str!("../queries/details.graphql");

/// A fixed query document together with the response key its rows live
/// under (`data.<root_field>`).
#[derive(Clone, Debug)]
pub struct FixedQuery {
    pub document: &'static str,
    pub root_field: String,
}

impl FixedQuery {
    pub fn parse(document: &'static str) -> Result<Self, String> {
        let root_fields = extract_root_fields(document)?;
        match root_fields.as_slice() {
            [root_field] => Ok(FixedQuery {
                document,
                root_field: root_field.clone(),
            }),
            _ => Err(format!(
                "Expected exactly one root field, found {:?}",
                root_fields
            )),
        }
    }

    /// The rows under `data.<root_field>`, or `None` when the response does
    /// not carry a list there.
    pub fn rows<'a>(&self, response: &'a Value) -> Option<&'a Vec<Value>> {
        response.get("data")?.get(&self.root_field)?.as_array()
    }
}

/// The three documents the pipeline issues, parsed once.
#[derive(Clone, Debug)]
pub struct Queries {
    pub entity_id: FixedQuery,
    pub processes: FixedQuery,
    pub details: FixedQuery,
}

impl Queries {
    pub fn new() -> Result<Self, String> {
        Ok(Queries {
            entity_id: FixedQuery::parse(ENTITY_ID_QUERY)?,
            processes: FixedQuery::parse(PROCESSES_QUERY)?,
            details: FixedQuery::parse(DETAILS_QUERY)?,
        })
    }
}

fn extract_root_fields(document: &str) -> Result<Vec<String>, String> {
    let query_document =
        parse_query::<String>(document).map_err(|e| format!("Failed to parse query: {}", e))?;

    let mut fields = Vec::new();

    for definition in &query_document.definitions {
        if let Definition::Operation(op) = definition {
            match op {
                OperationDefinition::Query(q) => collect_fields(&q.selection_set, &mut fields),
                OperationDefinition::SelectionSet(set) => collect_fields(set, &mut fields),
                _ => return Err("Only query operations are supported".to_string()),
            }
        }
    }

    Ok(fields)
}

fn collect_fields(selection_set: &SelectionSet<'_, String>, fields: &mut Vec<String>) {
    for selection in &selection_set.items {
        if let Selection::Field(field) = selection {
            // Responses are keyed by alias when one is given.
            fields.push(field.alias.clone().unwrap_or_else(|| field.name.clone()));
        }
    }
}
