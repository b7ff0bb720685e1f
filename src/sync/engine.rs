//! Push and pull between the local record store and a remote blob.
//!
//! Push uploads a full snapshot, overwriting whatever is there. Pull downloads
//! the snapshot, validates all of it, and only then replaces local state in a
//! single transaction. Nothing is merged.

use std::sync::Arc;

use serde::Serialize;

use super::error::{SyncError, SyncResult};
use super::snapshot::Snapshot;
use super::transport::{Connector, Credentials};
use crate::records::RecordStore;

/// Object name used when none is configured.
pub const DEFAULT_OBJECT_NAME: &str = "pomotrack-sync.json";

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub exported_sessions: usize,
    pub exported_tasks: usize,
    /// RFC 3339 timestamp written into the snapshot
    pub exported_at: String,
}

/// Outcome of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    pub imported_sessions: usize,
    pub imported_tasks: usize,
}

/// Runs snapshot exchanges for one store against one kind of remote.
pub struct SyncEngine<S: RecordStore> {
    store: Arc<S>,
    connector: Arc<dyn Connector>,
    object_name: String,
}

impl<S: RecordStore> SyncEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>, connector: Arc<dyn Connector>) -> Self {
        Self {
            store,
            connector,
            object_name: DEFAULT_OBJECT_NAME.to_string(),
        }
    }

    /// Read and write a different object in the container.
    #[must_use]
    pub fn with_object_name(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = object_name.into();
        self
    }

    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Upload every local session and task.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` before any I/O if a credential field is
    /// blank, `Store` if local records cannot be read, and `RemoteTransport`
    /// if the upload fails. Local state is never modified.
    pub fn push(&self, credentials: &Credentials) -> SyncResult<PushReport> {
        credentials.validate()?;

        let (sessions, tasks) = self
            .store
            .read_all()
            .map_err(|e| SyncError::Store(e.to_string()))?;
        let snapshot = Snapshot::new(sessions, tasks);
        let bytes = snapshot.to_bytes();

        let transport = self.connector.connect(credentials)?;
        transport.put(&self.object_name, &bytes)?;

        let report = PushReport {
            exported_sessions: snapshot.sessions.len(),
            exported_tasks: snapshot.tasks.len(),
            exported_at: snapshot.exported_at_string().unwrap_or_default(),
        };
        tracing::info!(
            container = %credentials.container_name,
            object = %self.object_name,
            sessions = report.exported_sessions,
            tasks = report.exported_tasks,
            bytes = bytes.len(),
            "pushed snapshot"
        );
        Ok(report)
    }

    /// Replace local state with the remote snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` before any I/O, `RemoteTransport` if the
    /// download fails (including a missing object), `InvalidSyncPayload` if
    /// the document or any record in it is invalid, and `Store` if the
    /// replacement cannot be committed. In every error case the local store is
    /// left exactly as it was.
    pub fn pull(&self, credentials: &Credentials) -> SyncResult<PullReport> {
        credentials.validate()?;

        let transport = self.connector.connect(credentials)?;
        let bytes = transport.get(&self.object_name)?;

        let snapshot = Snapshot::from_bytes(&bytes).map_err(|e| {
            tracing::warn!(object = %self.object_name, error = %e, "rejected snapshot");
            SyncError::InvalidSyncPayload(e)
        })?;

        self.store
            .replace_all(&snapshot.sessions, &snapshot.tasks)
            .map_err(|e| SyncError::Store(e.to_string()))?;

        let report = PullReport {
            imported_sessions: snapshot.sessions.len(),
            imported_tasks: snapshot.tasks.len(),
        };
        tracing::info!(
            container = %credentials.container_name,
            object = %self.object_name,
            sessions = report.imported_sessions,
            tasks = report.imported_tasks,
            "pulled snapshot"
        );
        Ok(report)
    }
}

impl<S: RecordStore + 'static> SyncEngine<S> {
    /// [`push`](Self::push) on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// As [`push`](Self::push), plus `Task` if the worker fails to complete.
    pub async fn push_async(self: Arc<Self>, credentials: Credentials) -> SyncResult<PushReport> {
        tokio::task::spawn_blocking(move || self.push(&credentials))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }

    /// [`pull`](Self::pull) on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// As [`pull`](Self::pull), plus `Task` if the worker fails to complete.
    pub async fn pull_async(self: Arc<Self>, credentials: Credentials) -> SyncResult<PullReport> {
        tokio::task::spawn_blocking(move || self.pull(&credentials))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PomotrackError;
    use crate::records::{Session, SessionType, SqliteStore, Task, TaskStatus};
    use crate::storage::Database;
    use crate::sync::error::{DecodeError, TransportError};
    use crate::sync::transport::{BlobTransport, MemoryTransport, MockBlobTransport};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    const CONTAINER: &str = "pomo";

    fn creds() -> Credentials {
        Credentials::new("acct", CONTAINER, "key")
    }

    fn store() -> Arc<SqliteStore> {
        Arc::new(SqliteStore::with_database(Database::open_in_memory().unwrap()))
    }

    fn engine(store: &Arc<SqliteStore>, remote: &MemoryTransport) -> SyncEngine<SqliteStore> {
        SyncEngine::new(Arc::clone(store), Arc::new(remote.clone()))
    }

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            session_type: SessionType::Focus,
            label: "Writing".to_string(),
            started_at: 1_700_000_000_000,
            completed_at: 1_700_001_500_000,
            duration: 1500,
        }
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            status,
            pomodoros_completed: 2,
            created_at: 1_700_000_000_000,
            completed_at: None,
        }
    }

    fn sorted<T: Clone, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
        let mut items = items.to_vec();
        items.sort_by_key(|item| key(item));
        items
    }

    fn remote_json(remote: &MemoryTransport) -> Value {
        let bytes = remote.object(CONTAINER, DEFAULT_OBJECT_NAME).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Hands out one pre-built transport.
    struct OneShot(Mutex<Option<Box<dyn BlobTransport>>>);

    impl OneShot {
        fn new(transport: impl BlobTransport + 'static) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Some(Box::new(transport)))))
        }
    }

    impl Connector for OneShot {
        fn connect(&self, _: &Credentials) -> Result<Box<dyn BlobTransport>, TransportError> {
            self.0
                .lock()
                .take()
                .ok_or_else(|| TransportError::Network("already connected".to_string()))
        }
    }

    /// Store whose every call fails.
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn read_all_sessions(&self) -> Result<Vec<Session>, PomotrackError> {
            Err(PomotrackError::Database("disk I/O error".to_string()))
        }

        fn read_all_tasks(&self) -> Result<Vec<Task>, PomotrackError> {
            Err(PomotrackError::Database("disk I/O error".to_string()))
        }

        fn replace_all(&self, _: &[Session], _: &[Task]) -> Result<(), PomotrackError> {
            Err(PomotrackError::Database("disk I/O error".to_string()))
        }
    }

    #[test]
    fn test_push_then_pull_restores_records() {
        let remote = MemoryTransport::new();
        let source = store();
        source.upsert_session(&session("s1")).unwrap();
        source.create_task(&task("t1", TaskStatus::Todo)).unwrap();

        let pushed = engine(&source, &remote).push(&creds()).unwrap();
        assert_eq!(pushed.exported_sessions, 1);
        assert_eq!(pushed.exported_tasks, 1);

        let doc = remote_json(&remote);
        assert_eq!(doc["version"], 1);
        assert_eq!(doc["exportedAt"], pushed.exported_at.as_str());
        assert_eq!(doc["sessions"].as_array().unwrap().len(), 1);
        assert_eq!(doc["tasks"].as_array().unwrap().len(), 1);

        let target = store();
        let pulled = engine(&target, &remote).pull(&creds()).unwrap();
        assert_eq!(
            pulled,
            PullReport {
                imported_sessions: 1,
                imported_tasks: 1
            }
        );
        assert_eq!(target.read_all_sessions().unwrap(), vec![session("s1")]);
        assert_eq!(
            target.read_all_tasks().unwrap(),
            vec![task("t1", TaskStatus::Todo)]
        );
    }

    #[test]
    fn test_round_trip_empty_store() {
        let remote = MemoryTransport::new();
        let pushed = engine(&store(), &remote).push(&creds()).unwrap();
        assert_eq!((pushed.exported_sessions, pushed.exported_tasks), (0, 0));

        let target = store();
        target.upsert_session(&session("local")).unwrap();
        let pulled = engine(&target, &remote).pull(&creds()).unwrap();

        assert_eq!((pulled.imported_sessions, pulled.imported_tasks), (0, 0));
        assert!(target.read_all_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_many_records() {
        let remote = MemoryTransport::new();
        let source = store();
        for i in 0..20 {
            let mut s = session(&format!("s{i}"));
            s.started_at += i;
            source.upsert_session(&s).unwrap();
        }
        let mut done = task("done", TaskStatus::Done);
        done.completed_at = Some(1_700_009_000_000);
        source.create_task(&done).unwrap();
        source.create_task(&task("doing", TaskStatus::InProgress)).unwrap();

        engine(&source, &remote).push(&creds()).unwrap();
        let target = store();
        engine(&target, &remote).pull(&creds()).unwrap();

        let by_id = |s: &Session| s.id.clone();
        assert_eq!(
            sorted(&target.read_all_sessions().unwrap(), by_id),
            sorted(&source.read_all_sessions().unwrap(), by_id)
        );
        let by_task_id = |t: &Task| t.id.clone();
        assert_eq!(
            sorted(&target.read_all_tasks().unwrap(), by_task_id),
            sorted(&source.read_all_tasks().unwrap(), by_task_id)
        );
    }

    #[test]
    fn test_repeated_push_carries_same_content() {
        let remote = MemoryTransport::new();
        let source = store();
        source.upsert_session(&session("s1")).unwrap();
        source.create_task(&task("t1", TaskStatus::Todo)).unwrap();
        let engine = engine(&source, &remote);

        engine.push(&creds()).unwrap();
        let first = remote_json(&remote);
        engine.push(&creds()).unwrap();
        let second = remote_json(&remote);

        assert_eq!(first["sessions"], second["sessions"]);
        assert_eq!(first["tasks"], second["tasks"]);
        assert_eq!(first["version"], second["version"]);
    }

    #[test]
    fn test_pull_replaces_local_records() {
        let remote = MemoryTransport::new();
        let source = store();
        source.upsert_session(&session("C")).unwrap();
        engine(&source, &remote).push(&creds()).unwrap();

        let target = store();
        target.upsert_session(&session("A")).unwrap();
        target.upsert_session(&session("B")).unwrap();
        target.create_task(&task("local", TaskStatus::Todo)).unwrap();

        engine(&target, &remote).pull(&creds()).unwrap();

        let ids: Vec<String> = target
            .read_all_sessions()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["C".to_string()]);
        assert!(target.read_all_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_pull_with_one_bad_record_leaves_store_untouched() {
        let remote = MemoryTransport::new();
        let doc = json!({
            "version": 1,
            "exportedAt": "2026-01-01T00:00:00.000Z",
            "sessions": [
                {"id": "ok", "type": "focus", "label": "", "startedAt": 0,
                 "completedAt": 1, "duration": 1},
                {"id": "bad", "type": "focus", "label": ""}
            ],
            "tasks": []
        });
        remote.insert(CONTAINER, DEFAULT_OBJECT_NAME, doc.to_string());

        let target = store();
        target.upsert_session(&session("keep")).unwrap();

        let err = engine(&target, &remote).pull(&creds()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::InvalidSyncPayload(DecodeError::InvalidRecord { index: 1, .. })
        ));
        assert_eq!(target.read_all_sessions().unwrap(), vec![session("keep")]);
    }

    #[test]
    fn test_pull_malformed_document() {
        let remote = MemoryTransport::new();
        remote.insert(CONTAINER, DEFAULT_OBJECT_NAME, "{\"sessions\": []}");

        let target = store();
        target.create_task(&task("keep", TaskStatus::Todo)).unwrap();

        let err = engine(&target, &remote).pull(&creds()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::InvalidSyncPayload(DecodeError::MalformedPayload(_))
        ));
        assert_eq!(target.read_all_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_pull_fills_missing_optional_task_fields() {
        let remote = MemoryTransport::new();
        let doc = json!({
            "version": 1,
            "sessions": [],
            "tasks": [{"id": "t", "title": "Plain", "status": "todo", "createdAt": 5}]
        });
        remote.insert(CONTAINER, DEFAULT_OBJECT_NAME, doc.to_string());

        let target = store();
        engine(&target, &remote).pull(&creds()).unwrap();

        let pulled = target.get_task("t").unwrap().unwrap();
        assert_eq!(pulled.pomodoros_completed, 0);
        assert_eq!(pulled.completed_at, None);
    }

    #[test]
    fn test_pull_duplicate_ids_last_wins() {
        let remote = MemoryTransport::new();
        let doc = json!({
            "version": 1,
            "sessions": [],
            "tasks": [
                {"id": "t", "title": "first", "status": "todo", "createdAt": 1},
                {"id": "t", "title": "second", "status": "todo", "createdAt": 1}
            ]
        });
        remote.insert(CONTAINER, DEFAULT_OBJECT_NAME, doc.to_string());

        let target = store();
        let report = engine(&target, &remote).pull(&creds()).unwrap();

        assert_eq!(report.imported_tasks, 2);
        let tasks = target.read_all_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "second");
    }

    #[test]
    fn test_pull_missing_object_is_transport_error() {
        let target = store();
        target.upsert_session(&session("keep")).unwrap();

        let err = engine(&target, &MemoryTransport::new())
            .pull(&creds())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteTransport(TransportError::NotFound(_))
        ));
        assert_eq!(target.read_all_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_get_failure_leaves_store_untouched() {
        let mut mock = MockBlobTransport::new();
        mock.expect_get()
            .times(1)
            .returning(|_| Err(TransportError::Network("connection reset".to_string())));
        mock.expect_put().never();

        let target = store();
        target.create_task(&task("keep", TaskStatus::Todo)).unwrap();

        let err = SyncEngine::new(Arc::clone(&target), OneShot::new(mock))
            .pull(&creds())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteTransport(TransportError::Network(ref d)) if d == "connection reset"
        ));
        assert!(err.is_retryable());
        assert_eq!(target.read_all_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_put_failure_is_transport_error() {
        let mut mock = MockBlobTransport::new();
        mock.expect_put()
            .withf(|name, _| name == DEFAULT_OBJECT_NAME)
            .times(1)
            .returning(|_, _| Err(TransportError::Unauthorized("bad signature".to_string())));

        let source = store();
        source.upsert_session(&session("s1")).unwrap();

        let err = SyncEngine::new(Arc::clone(&source), OneShot::new(mock))
            .push(&creds())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteTransport(TransportError::Unauthorized(_))
        ));
        assert_eq!(source.read_all_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_credentials_rejected_before_io() {
        let mut mock = MockBlobTransport::new();
        mock.expect_put().never();
        mock.expect_get().never();
        let engine = SyncEngine::new(store(), OneShot::new(mock));

        let blank_key = Credentials::new("acct", CONTAINER, " ");
        assert!(matches!(
            engine.push(&blank_key),
            Err(SyncError::InvalidCredentials(_))
        ));
        assert!(matches!(
            engine.pull(&blank_key),
            Err(SyncError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_store_failures() {
        let remote = MemoryTransport::new();
        let engine = SyncEngine::new(Arc::new(BrokenStore), Arc::new(remote.clone()));

        assert!(matches!(engine.push(&creds()), Err(SyncError::Store(_))));
        assert!(remote.object(CONTAINER, DEFAULT_OBJECT_NAME).is_none());

        remote.insert(
            CONTAINER,
            DEFAULT_OBJECT_NAME,
            json!({"version": 1, "sessions": [], "tasks": []}).to_string(),
        );
        assert!(matches!(engine.pull(&creds()), Err(SyncError::Store(_))));
    }

    #[test]
    fn test_custom_object_name() {
        let remote = MemoryTransport::new();
        let engine = engine(&store(), &remote).with_object_name("backup.json");
        engine.push(&creds()).unwrap();

        assert!(remote.object(CONTAINER, "backup.json").is_some());
        assert!(remote.object(CONTAINER, DEFAULT_OBJECT_NAME).is_none());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = PullReport {
            imported_sessions: 3,
            imported_tasks: 1,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"importedSessions": 3, "importedTasks": 1})
        );
    }

    #[tokio::test]
    async fn test_async_push_and_pull() {
        let remote = MemoryTransport::new();
        let source = store();
        source.create_task(&task("t1", TaskStatus::InProgress)).unwrap();

        let pusher = Arc::new(engine(&source, &remote));
        let pushed = pusher.push_async(creds()).await.unwrap();
        assert_eq!(pushed.exported_tasks, 1);

        let target = store();
        let puller = Arc::new(engine(&target, &remote));
        let pulled = puller.pull_async(creds()).await.unwrap();
        assert_eq!(pulled.imported_tasks, 1);
        assert_eq!(
            target.read_all_tasks().unwrap(),
            vec![task("t1", TaskStatus::InProgress)]
        );
    }
}
