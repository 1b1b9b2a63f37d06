use std::collections::HashSet;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::*;
use crate::error::ExplorerError;
use crate::gateway::InMemoryGateway;
use crate::model::Value;
use crate::notify::RecordingSink;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Objects,
    Fields(String),
    Count(Option<FilterSpec>),
    Fetch {
        offset: usize,
        fields: Vec<String>,
        filter: Option<FilterSpec>,
    },
}

/// Blocks page fetches until released
#[derive(Default)]
struct Gate {
    entered: Notify,
    release: Notify,
}

/// In-memory backend that records calls and can fail or stall on demand
#[derive(Default)]
struct ScriptedGateway {
    inner: InMemoryGateway,
    calls: StdMutex<Vec<Call>>,
    fail_offsets: StdMutex<HashSet<usize>>,
    gate: Option<Arc<Gate>>,
}

impl ScriptedGateway {
    fn new(inner: InMemoryGateway) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn fail_once_at(&self, offset: usize) {
        self.fail_offsets.lock().unwrap().insert(offset);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn fetch_offsets(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch { offset, .. } => Some(offset),
                _ => None,
            })
            .collect()
    }

    fn count_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Count(_)))
            .count()
    }
}

#[async_trait]
impl MetadataGateway for ScriptedGateway {
    async fn list_objects(&self) -> GatewayResult<Vec<ObjectName>> {
        self.record(Call::Objects);
        self.inner.list_objects().await
    }

    async fn list_fields(&self, object: &ObjectName) -> GatewayResult<Vec<FieldName>> {
        self.record(Call::Fields(object.to_string()));
        self.inner.list_fields(object).await
    }
}

#[async_trait]
impl QueryGateway for ScriptedGateway {
    async fn count_rows(
        &self,
        object: &ObjectName,
        filter: Option<&FilterSpec>,
    ) -> GatewayResult<u64> {
        self.record(Call::Count(filter.cloned()));
        self.inner.count_rows(object, filter).await
    }

    async fn fetch_rows(
        &self,
        object: &ObjectName,
        fields: &[FieldName],
        filter: Option<&FilterSpec>,
        offset: usize,
    ) -> GatewayResult<Vec<Row>> {
        self.record(Call::Fetch {
            offset,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            filter: filter.cloned(),
        });
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_offsets.lock().unwrap().remove(&offset) {
            return Err(GatewayError::Unavailable("connection reset".to_string()));
        }
        self.inner.fetch_rows(object, fields, filter, offset).await
    }
}

fn accounts(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let industry = if i % 2 == 0 { "Technology" } else { "Banking" };
            Row::from_iter([
                ("Name", Value::from(format!("Account {i:02}"))),
                ("Industry", Value::from(industry)),
                ("Phone", Value::from(format!("555-{i:04}"))),
            ])
        })
        .collect()
}

fn backend(rows: usize) -> InMemoryGateway {
    InMemoryGateway::new()
        .with_object("Account", ["Name", "Industry", "Phone"], accounts(rows))
        .with_object(
            "Contact",
            ["Email"],
            vec![Row::from_iter([("Email", "a@example.com")])],
        )
        .with_object("Lead", ["Company"], Vec::new())
}

struct Harness {
    explorer: DataExplorer,
    gateway: Arc<ScriptedGateway>,
    sink: Arc<RecordingSink>,
}

fn harness_with(gateway: ScriptedGateway) -> Harness {
    let gateway = Arc::new(gateway);
    let sink = Arc::new(RecordingSink::new());
    let explorer = DataExplorer::new(gateway.clone(), gateway.clone(), sink.clone());
    Harness {
        explorer,
        gateway,
        sink,
    }
}

fn harness(rows: usize) -> Harness {
    harness_with(ScriptedGateway::new(backend(rows)))
}

async fn account_session(h: &Harness) {
    h.explorer.select_object("Account").await.unwrap();
    h.explorer.choose_fields(["Name", "Industry"]).await;
}

async fn choose_tech_filter(h: &Harness) {
    assert!(h.explorer.choose_filter_field("Industry").await);
    h.explorer.choose_operator(Operator::Contains).await;
    h.explorer.set_filter_expression("Tech").await;
}

#[tokio::test]
async fn test_account_pagination_scenario() {
    let h = harness(45);
    account_session(&h).await;

    let first = h.explorer.fetch().await.unwrap();
    assert_eq!(
        first,
        PageOutcome::Loaded {
            appended: 20,
            total_rows: 20
        }
    );
    assert_eq!(h.explorer.offset().await, 0);

    let second = h.explorer.load_more().await.unwrap();
    assert_eq!(
        second,
        PageOutcome::Loaded {
            appended: 20,
            total_rows: 40
        }
    );
    assert_eq!(h.explorer.offset().await, 20);

    let third = h.explorer.load_more().await.unwrap();
    assert_eq!(
        third,
        PageOutcome::Loaded {
            appended: 5,
            total_rows: 45
        }
    );
    assert_eq!(h.explorer.offset().await, 40);

    let fourth = h.explorer.load_more().await.unwrap();
    assert_eq!(fourth, PageOutcome::Exhausted);
    assert_eq!(h.explorer.offset().await, 60);

    let view = h.explorer.view().await;
    assert_eq!(view.state, ExplorerState::Exhausted);
    assert_eq!(view.load_status, LoadStatus::NoMoreData);
    assert_eq!(view.total_count, Some(45));

    // Count once per session, no fetch once the offset passed the total
    assert_eq!(h.gateway.count_calls(), 1);
    assert_eq!(h.gateway.fetch_offsets(), vec![0, 20, 40]);
}

#[tokio::test]
async fn test_offset_tracks_load_more_count() {
    let h = harness(200);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();

    for n in 1..=5 {
        h.explorer.load_more().await.unwrap();
        assert_eq!(h.explorer.offset().await, n * PAGE_SIZE);
    }
    assert_eq!(h.explorer.dataset().await.len(), 6 * PAGE_SIZE);
}

#[tokio::test]
async fn test_fetch_requests_selected_fields_in_order() {
    let h = harness(3);
    h.explorer.select_object("Account").await.unwrap();
    let columns = h.explorer.choose_fields(["Phone", "Name"]).await;
    assert_eq!(
        columns.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
        vec!["Phone", "Name"]
    );

    h.explorer.fetch().await.unwrap();
    let last = h.gateway.calls().last().cloned().unwrap();
    assert_eq!(
        last,
        Call::Fetch {
            offset: 0,
            fields: vec!["Phone".to_string(), "Name".to_string()],
            filter: None,
        }
    );
}

#[tokio::test]
async fn test_fetch_without_fields_warns_and_skips_backend() {
    let h = harness(10);
    h.explorer.select_object("Account").await.unwrap();

    let outcome = h.explorer.fetch().await.unwrap();
    assert_eq!(outcome, PageOutcome::NoFieldsSelected);
    assert_eq!(h.sink.kinds(), vec![NotificationKind::NoFieldsSelected]);
    assert_eq!(h.gateway.calls(), vec![Call::Fields("Account".to_string())]);
}

#[tokio::test]
async fn test_empty_object_reports_no_records() {
    let h = harness(10);
    h.explorer.select_object("Lead").await.unwrap();
    h.explorer.choose_fields(["Company"]).await;

    let outcome = h.explorer.fetch().await.unwrap();
    assert_eq!(outcome, PageOutcome::NoRecords);
    assert_eq!(h.sink.kinds(), vec![NotificationKind::NoRecordsFound]);
    assert_eq!(h.gateway.fetch_offsets(), Vec::<usize>::new());
}

#[tokio::test]
async fn test_apply_filter_replaces_dataset_with_filtered_page() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.load_more().await.unwrap();
    choose_tech_filter(&h).await;

    let outcome = h.explorer.apply_filter().await.unwrap();
    assert_eq!(outcome, FilterOutcome::Applied { rows: 20 });

    let spec = FilterSpec::new("Industry", Operator::Contains, "Tech");
    assert_eq!(
        h.gateway.calls().last().cloned().unwrap(),
        Call::Fetch {
            offset: 0,
            fields: vec!["Name".to_string(), "Industry".to_string()],
            filter: Some(spec.clone()),
        }
    );

    let expected = backend(45)
        .fetch_rows(
            &ObjectName::from("Account"),
            &[FieldName::from("Name"), FieldName::from("Industry")],
            Some(&spec),
            0,
        )
        .await
        .unwrap();
    let view = h.explorer.view().await;
    assert_eq!(view.dataset, Dataset::from(expected));
    assert_eq!(view.state, ExplorerState::Filtered);
    assert_eq!(view.active_filter, Some(spec));
    assert_eq!(view.offset, 0);
}

#[tokio::test]
async fn test_apply_filter_without_operator_is_noop() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.choose_filter_field("Industry").await;
    let calls_before = h.gateway.calls().len();

    let outcome = h.explorer.apply_filter().await.unwrap();
    assert_eq!(outcome, FilterOutcome::Skipped);
    assert_eq!(h.gateway.calls().len(), calls_before);
    assert_eq!(h.explorer.state().await, ExplorerState::Loaded);
}

#[tokio::test]
async fn test_clear_filter_restores_unfiltered_snapshot() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.load_more().await.unwrap();
    let before = h.explorer.dataset().await;
    let offset_before = h.explorer.offset().await;

    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();
    assert_ne!(h.explorer.dataset().await, before);
    let calls_before_clear = h.gateway.calls().len();

    assert!(h.explorer.clear_filter().await);
    let view = h.explorer.view().await;
    assert_eq!(view.dataset, before);
    assert_eq!(view.offset, offset_before);
    assert_eq!(view.state, ExplorerState::Loaded);
    assert!(view.active_filter.is_none());
    assert_eq!(h.gateway.calls().len(), calls_before_clear);

    // Pagination resumes where the unfiltered view left off
    h.explorer.load_more().await.unwrap();
    assert_eq!(h.explorer.dataset().await.len(), 45);
}

#[tokio::test]
async fn test_clear_filter_without_snapshot_is_noop() {
    let h = harness(45);
    account_session(&h).await;
    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();
    let filtered = h.explorer.dataset().await;

    assert!(!h.explorer.clear_filter().await);
    assert_eq!(h.explorer.dataset().await, filtered);
    assert_eq!(h.explorer.state().await, ExplorerState::Filtered);
}

#[tokio::test]
async fn test_clear_filter_after_failed_page_keeps_offset() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.gateway.fail_once_at(20);
    h.explorer.load_more().await.unwrap_err();

    assert!(!h.explorer.clear_filter().await);
    assert_eq!(h.explorer.offset().await, 20);
    assert_eq!(h.explorer.dataset().await.len(), 20);

    // The failed page stays skipped
    h.explorer.load_more().await.unwrap();
    assert_eq!(h.gateway.fetch_offsets(), vec![0, 20, 40]);
}

#[tokio::test]
async fn test_clear_filter_when_exhausted_is_noop() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    for _ in 0..3 {
        h.explorer.load_more().await.unwrap();
    }
    assert_eq!(h.explorer.state().await, ExplorerState::Exhausted);

    assert!(!h.explorer.clear_filter().await);
    let view = h.explorer.view().await;
    assert_eq!(view.state, ExplorerState::Exhausted);
    assert_eq!(view.offset, 60);
    assert_eq!(view.dataset.len(), 45);

    let outcome = h.explorer.load_more().await.unwrap();
    assert_eq!(outcome, PageOutcome::Exhausted);
    assert_eq!(h.gateway.fetch_offsets(), vec![0, 20, 40]);
}

#[tokio::test]
async fn test_clear_filter_restores_exhausted_view() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    for _ in 0..3 {
        h.explorer.load_more().await.unwrap();
    }
    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();

    assert!(h.explorer.clear_filter().await);
    let view = h.explorer.view().await;
    assert_eq!(view.state, ExplorerState::Exhausted);
    assert_eq!(view.offset, 60);
    assert_eq!(view.dataset.len(), 45);
}

#[tokio::test]
async fn test_failed_filter_keeps_previous_view() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    let before = h.explorer.dataset().await;
    choose_tech_filter(&h).await;
    h.gateway.fail_once_at(0);

    let err = h.explorer.apply_filter().await.unwrap_err();
    assert!(matches!(
        err,
        ExplorerError::Gateway(GatewayError::Unavailable(_))
    ));
    let view = h.explorer.view().await;
    assert_eq!(view.dataset, before);
    assert_eq!(view.state, ExplorerState::Loaded);
    assert!(view.active_filter.is_none());
    assert!(!view.loading);
    assert!(!h.explorer.clear_filter().await);

    let outcome = h.explorer.load_more().await.unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Loaded {
            appended: 20,
            total_rows: 40
        }
    );
}

#[tokio::test]
async fn test_load_more_in_filtered_view_uses_filter() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();

    let outcome = h.explorer.load_more().await.unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Loaded {
            appended: 3,
            total_rows: 23
        }
    );

    let spec = FilterSpec::new("Industry", Operator::Contains, "Tech");
    let calls = h.gateway.calls();
    assert!(calls.contains(&Call::Count(Some(spec.clone()))));
    assert_eq!(
        calls.last().cloned().unwrap(),
        Call::Fetch {
            offset: 20,
            fields: vec!["Name".to_string(), "Industry".to_string()],
            filter: Some(spec),
        }
    );
    assert_eq!(h.explorer.state().await, ExplorerState::Filtered);
}

#[tokio::test]
async fn test_object_change_clears_session() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.load_more().await.unwrap();
    h.explorer.select_rows(&[0, 1]).await;
    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();

    let fields = h.explorer.select_object("Contact").await.unwrap();
    assert_eq!(fields, vec!["Email"]);

    let view = h.explorer.view().await;
    assert_eq!(view.state, ExplorerState::ObjectChosen);
    assert!(view.fields.is_empty());
    assert!(view.columns.is_empty());
    assert!(view.dataset.is_empty());
    assert_eq!(view.selected, 0);
    assert!(view.active_filter.is_none());
    assert!(view.filter_fields.is_empty());
    assert_eq!(view.offset, 0);
    assert_eq!(view.total_count, None);
}

#[tokio::test]
async fn test_unknown_object_leaves_no_field_options() {
    let h = harness(5);
    let err = h.explorer.select_object("Opportunity").await.unwrap_err();
    assert!(err.is_gateway());

    let view = h.explorer.view().await;
    assert_eq!(view.object, Some(ObjectName::from("Opportunity")));
    assert!(view.field_options.is_empty());
    assert!(h.sink.kinds().is_empty());
}

#[tokio::test]
async fn test_failed_page_is_skipped_on_next_load_more() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.gateway.fail_once_at(20);

    let err = h.explorer.load_more().await.unwrap_err();
    assert!(matches!(
        err,
        ExplorerError::Gateway(GatewayError::Unavailable(_))
    ));
    assert_eq!(h.explorer.offset().await, 20);
    assert_eq!(h.explorer.dataset().await.len(), 20);
    assert_eq!(h.explorer.state().await, ExplorerState::Loaded);

    let outcome = h.explorer.load_more().await.unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Loaded {
            appended: 5,
            total_rows: 25
        }
    );
    assert_eq!(h.gateway.fetch_offsets(), vec![0, 20, 40]);
}

#[tokio::test]
async fn test_export_selected_rows_scenario() {
    let h = harness(45);
    h.explorer.select_object("Account").await.unwrap();
    h.explorer.choose_fields(["Name"]).await;
    h.explorer.fetch().await.unwrap();

    assert_eq!(h.explorer.select_rows(&[3, 1, 99]).await, 2);
    let doc = h.explorer.export().await.unwrap();
    assert_eq!(doc.file_name, "Account.xls");
    assert_eq!(
        doc.content,
        "<table><tr><th>Name</th></tr><tr><td>Account 03</td></tr><tr><td>Account 01</td></tr></table>"
    );
    assert!(h.sink.kinds().is_empty());
}

#[tokio::test]
async fn test_export_empty_selection_notifies() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.select_rows(&[0, 1]).await;
    h.explorer.set_selection(Vec::new()).await;

    let err = h.explorer.export().await.unwrap_err();
    assert!(err.is_empty_selection());
    assert_eq!(
        h.sink.kinds(),
        vec![NotificationKind::NoRowsSelectedForExport]
    );
}

#[tokio::test]
async fn test_selection_outside_filtered_dataset_is_not_exported() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.select_rows(&[0, 1, 2]).await;
    choose_tech_filter(&h).await;
    h.explorer.apply_filter().await.unwrap();

    assert_eq!(h.explorer.current_selection().await.len(), 3);
    let err = h.explorer.export().await.unwrap_err();
    assert!(err.is_empty_selection());
}

#[tokio::test]
async fn test_csv_export_format() {
    let gateway = Arc::new(ScriptedGateway::new(backend(2)));
    let explorer = DataExplorer::new(
        gateway.clone(),
        gateway,
        Arc::new(RecordingSink::new()),
    )
    .with_export_format(ExportFormat::Csv);
    explorer.select_object("Account").await.unwrap();
    explorer.choose_fields(["Name", "Industry"]).await;
    explorer.fetch().await.unwrap();
    explorer.select_rows(&[0]).await;

    let doc = explorer.export().await.unwrap();
    assert_eq!(doc.file_name, "Account.csv");
    assert_eq!(doc.content, "Name,Industry\r\nAccount 00,Technology\r\n");
}

#[tokio::test]
async fn test_overlapping_request_is_busy() {
    let gate = Arc::new(Gate::default());
    let h = harness_with(ScriptedGateway::new(backend(45)).with_gate(gate.clone()));
    account_session(&h).await;

    let explorer = h.explorer.clone();
    let in_flight = tokio::spawn(async move { explorer.fetch().await });
    gate.entered.notified().await;

    assert!(h.explorer.view().await.loading);
    assert_eq!(h.explorer.load_more().await.unwrap(), PageOutcome::Busy);
    choose_tech_filter(&h).await;
    assert_eq!(h.explorer.apply_filter().await.unwrap(), FilterOutcome::Busy);

    gate.release.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Loaded {
            appended: 20,
            total_rows: 20
        }
    );
    assert_eq!(h.gateway.fetch_offsets(), vec![0]);
}

#[tokio::test]
async fn test_stale_response_is_discarded_after_object_change() {
    let gate = Arc::new(Gate::default());
    let h = harness_with(ScriptedGateway::new(backend(45)).with_gate(gate.clone()));
    account_session(&h).await;

    let explorer = h.explorer.clone();
    let in_flight = tokio::spawn(async move { explorer.fetch().await });
    gate.entered.notified().await;

    h.explorer.select_object("Contact").await.unwrap();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, PageOutcome::Discarded);

    let view = h.explorer.view().await;
    assert_eq!(view.object, Some(ObjectName::from("Contact")));
    assert!(view.dataset.is_empty());
    assert!(!view.loading);
    assert_eq!(view.state, ExplorerState::ObjectChosen);
}

#[tokio::test]
async fn test_field_change_restarts_pagination() {
    let h = harness(45);
    account_session(&h).await;
    h.explorer.fetch().await.unwrap();
    h.explorer.load_more().await.unwrap();

    h.explorer.choose_fields(["Phone"]).await;
    let view = h.explorer.view().await;
    assert_eq!(view.state, ExplorerState::FieldsChosen);
    assert_eq!(view.offset, 0);
    assert_eq!(view.dataset.len(), 40);

    let outcome = h.explorer.load_more().await.unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Loaded {
            appended: 20,
            total_rows: 20
        }
    );
    let dataset = h.explorer.dataset().await;
    assert!(dataset.iter().all(|row| row.get("Phone").is_some() && row.get("Name").is_none()));
}

#[tokio::test]
async fn test_load_objects_caches_list() {
    let h = harness(1);
    let objects = h.explorer.load_objects().await.unwrap();
    assert_eq!(objects, vec!["Account", "Contact", "Lead"]);
    assert_eq!(h.explorer.view().await.objects, objects);
    assert_eq!(h.gateway.calls(), vec![Call::Objects]);
}
