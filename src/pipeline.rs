use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    DetailRecord, FermentationReport, FungalEntity, Id, ProcessReport,
    navigate::{id_at, number_at, string_at},
    queries::{FixedQuery, Queries},
    query_client::QueryClient,
};

/// Resolve → enumerate → fetch, shared by the HTTP surface and the report
/// command. Every lookup degrades to an empty result on failure.
pub struct FermentationPipeline {
    query_client: Arc<Box<dyn QueryClient + Send + Sync>>,
    queries: Queries,
}

impl FermentationPipeline {
    pub fn new(query_client: Box<dyn QueryClient + Send + Sync>) -> Result<Self, String> {
        Ok(FermentationPipeline {
            query_client: Arc::new(query_client),
            queries: Queries::new()?,
        })
    }

    /// Id of the first entity whose name matches `name` case-insensitively.
    pub async fn resolve_entity_id(&self, name: &str) -> Option<Id> {
        let rows = self
            .run_query(&self.queries.entity_id, json!({ "nombre": name }))
            .await?;

        if rows.len() > 1 {
            debug!(entity = name, matches = rows.len(), "multiple entities matched; using the first");
        }
        rows.first().and_then(|row| id_at(row, &["id_Hongo"]))
    }

    pub async fn resolve_entity(&self, name: &str) -> Option<FungalEntity> {
        let id = self.resolve_entity_id(name).await?;
        Some(FungalEntity {
            id,
            name: name.to_string(),
        })
    }

    pub async fn list_processes(&self, entity_id: Id) -> Vec<Id> {
        self.run_query(&self.queries.processes, json!({ "id": entity_id }))
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|row| id_at(row, &["id_registro_fermentacion"]))
            .collect()
    }

    /// Detail rows in the order the backend sorted them (timestamp ascending).
    pub async fn fetch_details(&self, process_id: Id) -> Vec<DetailRecord> {
        self.run_query(&self.queries.details, json!({ "id": process_id }))
            .await
            .unwrap_or_default()
            .iter()
            .map(detail_from_row)
            .collect()
    }

    /// Runs the whole pipeline; `None` when the entity cannot be resolved.
    pub async fn report(&self, name: &str) -> Option<FermentationReport> {
        let entity = self.resolve_entity(name).await?;
        info!(entity = %entity.name, id = entity.id, "resolved entity");

        let mut processes = Vec::new();
        for process_id in self.list_processes(entity.id).await {
            let details = self.fetch_details(process_id).await;
            debug!(process_id, rows = details.len(), "fetched process details");
            processes.push(ProcessReport {
                process_id,
                details,
            });
        }

        Some(FermentationReport {
            entity: entity.name,
            processes,
        })
    }

    async fn run_query(&self, query: &FixedQuery, variables: Value) -> Option<Vec<Value>> {
        let response = match self.query_client.execute(query.document, variables.clone()).await {
            Ok(response) => response,
            Err(e) => {
                error!(query = %query.root_field, %variables, "{}", e);
                return None;
            }
        };

        let rows = query.rows(&response).cloned();
        if rows.is_none() {
            error!(query = %query.root_field, %response, "response carries no row list");
        }
        rows
    }
}

/// Flattens one `Registro_detalle` row; absent relations stay `None`.
pub fn detail_from_row(row: &Value) -> DetailRecord {
    DetailRecord {
        timestamp: string_at(row, &["fechaHoraRegistroDetalle"]).unwrap_or_default(),
        tempeh_temp: number_at(row, &["temperaturaByIdTemperaturaTempeh", "temp"]),
        ambient_temp: number_at(row, &["temperaturaByIdTemperaturaAmbiente", "temp"]),
        humidity: number_at(row, &["Humedad", "humed"]),
        ac_temp: number_at(row, &["AireAcondicionadoTemperatura", "Temperatura", "temp"]),
        stove_temp: number_at(row, &["EstufaTemperatura", "Temperatura", "temp"]),
        alarm_name: string_at(row, &["Alarma", "nombreAlarma"]),
    }
}
