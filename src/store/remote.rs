//! Repository backed by the hosted record store.

use super::client::{FetchParams, StoreClient};
use super::{apply_draft, Entity, Repository, WhereCondition};
use crate::error::{Result, StoreError};
use crate::models::RecordId;
use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

/// One table of the record store.
pub struct RemoteRepository<E> {
    client: Arc<StoreClient>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RemoteRepository<E> {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    fn decode_all(rows: Vec<Value>) -> Result<Vec<E>> {
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    fn decode_first(rows: Vec<Value>, action: &str) -> Result<E> {
        let row = rows.into_iter().next().ok_or_else(|| {
            StoreError::Upstream(format!("{} {} returned no record", action, E::TABLE))
        })?;
        Ok(serde_json::from_value(row)?)
    }
}

/// Serialize a draft into a write payload, optionally pinned to an id.
fn write_payload<D: serde::Serialize>(draft: &D, id: Option<RecordId>) -> Result<Value> {
    let mut payload = serde_json::to_value(draft)?;
    if let Value::Object(map) = &mut payload {
        map.remove("Id");
        if let Some(id) = id {
            map.insert("Id".to_string(), Value::from(id.get()));
        }
    }
    Ok(payload)
}

#[async_trait]
impl<E: Entity> Repository<E> for RemoteRepository<E> {
    async fn get_all(&self) -> Result<Vec<E>> {
        self.fetch_where(&[]).await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<E> {
        let fields = E::fields();
        match self.client.get_record_by_id(E::TABLE, id, &fields).await {
            Ok(Some(row)) => Ok(serde_json::from_value(row)?),
            Ok(None) => Err(StoreError::NotFound {
                table: E::TABLE,
                id: id.get(),
            }),
            Err(e) => {
                error!("Error fetching {} with id {}: {}", E::TABLE, id, e);
                Err(e)
            }
        }
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        let prepared = E::prepare(draft)?;
        let payload = write_payload(&prepared, None)?;

        let rows = self
            .client
            .create_records(E::TABLE, vec![payload])
            .await
            .map_err(|e| {
                error!("Error creating {}: {}", E::TABLE, e);
                e
            })?;
        Self::decode_first(rows, "create")
    }

    async fn update(&self, id: RecordId, draft: E::Draft) -> Result<E> {
        // The store reports a missing id as a generic batch failure.
        let current = self.get_by_id(id).await?;
        apply_draft(&current, &draft).map_err(|e| {
            error!("Error updating {} {}: {}", E::TABLE, id, e);
            e
        })?;
        let payload = write_payload(&draft, Some(id))?;

        let rows = self
            .client
            .update_records(E::TABLE, vec![payload])
            .await
            .map_err(|e| {
                error!("Error updating {} {}: {}", E::TABLE, id, e);
                e
            })?;
        Self::decode_first(rows, "update")
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        self.get_by_id(id).await?;
        self.client
            .delete_records(E::TABLE, &[id])
            .await
            .map_err(|e| {
                error!("Error deleting {} {}: {}", E::TABLE, id, e);
                e
            })?;
        Ok(true)
    }

    async fn fetch_where(&self, conditions: &[WhereCondition]) -> Result<Vec<E>> {
        let params = FetchParams {
            fields: E::fields(),
            conditions: conditions.to_vec(),
        };
        debug!(
            "Fetching {} with {} condition(s)",
            E::TABLE,
            params.conditions.len()
        );

        let rows = self
            .client
            .fetch_records(E::TABLE, &params)
            .await
            .map_err(|e| {
                error!("Error fetching {} records: {}", E::TABLE, e);
                e
            })?;
        Self::decode_all(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::models::{Agent, AgentDraft, Campus, Student, StudentDraft};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_test::{assert_err, assert_ok};

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| {
                        let line = line.to_ascii_lowercase();
                        line.strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .next()
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// A record store answering each request with the next canned body.
    /// Returns the repository and the request lines it received.
    async fn store_with(responses: Vec<Value>) -> (RemoteRepository<Student>, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            for body in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                let line = request.lines().next().unwrap_or_default().to_string();
                log.lock().unwrap().push(line);

                let body = body.to_string();
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
            }
        });

        let client = StoreClient::new(&StoreConfig {
            base_url: format!("http://{}", addr),
            project_id: "proj-1".to_string(),
            public_key: "pk-test".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();
        (RemoteRepository::new(Arc::new(client)), requests)
    }

    fn missing() -> Value {
        json!({"success": true, "data": null})
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let (repo, requests) = store_with(vec![missing()]).await;
        let err = assert_err!(repo.delete(RecordId::new(9).unwrap()).await);
        assert!(err.is_not_found());

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("/tables/student/get"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (repo, requests) = store_with(vec![missing()]).await;
        let draft = StudentDraft {
            course: Some("MBA".to_string()),
            ..Default::default()
        };
        let err = assert_err!(repo.update(RecordId::new(9).unwrap(), draft).await);
        assert!(err.is_not_found());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_existing_record() {
        let (repo, requests) = store_with(vec![
            json!({"success": true, "data": {"Id": 2, "Name": "Asha Gurung"}}),
            json!({"success": true, "results": [{"success": true}]}),
        ])
        .await;
        assert!(assert_ok!(repo.delete(RecordId::new(2).unwrap()).await));

        let requests = requests.lock().unwrap();
        assert!(requests[1].contains("/tables/student/delete"));
    }

    #[tokio::test]
    async fn test_update_blanking_name_is_not_sent() {
        let (repo, requests) = store_with(vec![json!({
            "success": true,
            "data": {"Id": 2, "Name": "Asha Gurung"}
        })])
        .await;
        let draft = StudentDraft {
            name: Some(String::new()),
            ..Default::default()
        };
        let err = assert_err!(repo.update(RecordId::new(2).unwrap(), draft).await);
        assert!(err.is_validation());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_update_payload_pins_id() {
        let draft: AgentDraft =
            serde_json::from_value(json!({"name": "Ram", "Id": 99})).unwrap();
        let payload = write_payload(&draft, Some(RecordId::new(4).unwrap())).unwrap();
        assert_eq!(payload, json!({"Id": 4, "Name": "Ram"}));
    }

    #[test]
    fn test_create_payload_has_no_id() {
        let draft = AgentDraft {
            name: Some("Ram".to_string()),
            email: Some("ram@example.com".to_string()),
            phone: Some("98".to_string()),
            active: Some(true),
        };
        let payload = write_payload(&draft, None).unwrap();
        assert!(payload.get("Id").is_none());
        assert_eq!(payload["email"], "ram@example.com");
    }

    #[test]
    fn test_decode_rows() {
        let rows = vec![
            json!({"Id": 1, "Name": "Kathmandu", "location": "Putalisadak"}),
            json!({"Id": 2, "Name": "Chitwan"}),
        ];
        let campuses = RemoteRepository::<Campus>::decode_all(rows).unwrap();
        assert_eq!(campuses.len(), 2);
        assert_eq!(campuses[1].location, "");
    }

    #[test]
    fn test_decode_first_empty_is_upstream() {
        let err = RemoteRepository::<Agent>::decode_first(Vec::new(), "create").unwrap_err();
        assert!(matches!(err, StoreError::Upstream(_)));
    }
}
