// tests/integration/full_sync.rs
//! Both sync phases against the fake Vista API and the in-memory store.

use super::fake_vista::{
    detail_body, mount_detail, mount_listing_pages, no_history, DETAIL_PATH, LISTING_PATH,
};
use crate::common::sync_config;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use vista_sync::{
    ConflictKey, ColumnName, ListingCode, MemoryStore, Phases, RecordingPause, Row, SyncEngine,
    TableName, VistaHttpClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PACING: Duration = Duration::from_millis(250);

fn engine(
    server: &MockServer,
    overrides: &[(&str, &str)],
    store: Arc<MemoryStore>,
    pause: RecordingPause,
) -> SyncEngine {
    let config = sync_config(&server.uri(), overrides);
    let transport = Arc::new(VistaHttpClient::new(config.api.timeout).unwrap());
    SyncEngine::new(config, transport, store, Arc::new(pause)).unwrap()
}

fn listing(code: &str, category: &str) -> Value {
    json!({
        "Codigo": code,
        "Categoria": category,
        "Bairro": "Centro",
        "Status": "Venda",
        "DataCadastro": "2023-11-20",
        "DataDeAtivacao": "0000-00-00",
        "DataAtualizacao": "2024-05-02",
    })
}

async fn mount_catalogue(server: &MockServer, times: u64) {
    mount_listing_pages(
        server,
        vec![
            vec![listing("A1", "Apartamento"), listing("A2", "Casa")],
            vec![listing("A3", "Sala"), json!({ "Codigo": "", "Categoria": "Terreno" })],
        ],
        times,
    )
    .await;

    mount_detail(
        server,
        "A1",
        ResponseTemplate::new(200).set_body_json(detail_body(
            "A1",
            &[
                (
                    "77",
                    json!({
                        "Data": "2024-03-01",
                        "Assunto": "Visita",
                        "Pendente": "Sim",
                        "ValorProposta": "350000.50"
                    }),
                ),
                ("78", json!({ "Data": "0000-00-00", "Pendente": "Nao" })),
            ],
        )),
    )
    .await;
    mount_detail(server, "A2", no_history()).await;
    mount_detail(
        server,
        "A3",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "status": 400, "message": "Imóvel não encontrado" })),
    )
    .await;
}

fn table(name: &str) -> TableName {
    TableName::new(name).unwrap()
}

fn codes(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter().map(|row| row[column].clone()).collect()
}

#[tokio::test]
async fn test_full_run_writes_listings_and_history() {
    let server = MockServer::start().await;
    mount_catalogue(&server, 1).await;
    let store = Arc::new(MemoryStore::new());
    let pause = RecordingPause::new();

    let report = engine(&server, &[], store.clone(), pause.clone())
        .run(Phases::All)
        .await
        .unwrap();

    let listings = report.listings.clone().unwrap();
    assert_eq!(listings.fetched, 4);
    assert_eq!(listings.dropped, 1);
    assert_eq!(listings.upsert.written, 3);

    let listing_rows = store.rows(&table("imoveis"));
    assert_eq!(
        codes(&listing_rows, "codigo"),
        vec![json!("A1"), json!("A2"), json!("A3")]
    );
    assert_eq!(listing_rows[0]["categoria"], json!("Apartamento"));
    assert_eq!(listing_rows[0]["datacadastro"], json!("2023-11-20"));
    assert_eq!(listing_rows[0]["datadeativacao"], Value::Null);

    let history = report.history.clone().unwrap();
    assert_eq!(history.enumerated, 3);
    assert_eq!(history.with_history, 1);
    assert_eq!(history.without_history, 1);
    assert_eq!(history.entries, 2);
    assert_eq!(history.skipped.len(), 1);
    assert_eq!(history.skipped[0].code, ListingCode::new("A3").unwrap());
    assert!(history.skipped[0].reason.contains("Imóvel não encontrado"));
    assert!(report.has_failures());

    let history_rows = store.rows(&table("imovel_prontuario"));
    assert_eq!(history_rows.len(), 2);
    assert_eq!(history_rows[0]["codigo_imovel"], json!("A1"));
    assert_eq!(history_rows[0]["codigo_prontuario"], json!(77));
    assert_eq!(history_rows[0]["data"], json!("2024-03-01"));
    assert_eq!(history_rows[0]["pendente"], json!(true));
    assert_eq!(history_rows[0]["valorproposta"], json!(350000.5));
    assert_eq!(history_rows[1]["codigo_prontuario"], json!(78));
    assert_eq!(history_rows[1]["data"], Value::Null);
    assert_eq!(history_rows[1]["pendente"], json!(false));

    // One pacing pause per listing, nothing else.
    assert_eq!(pause.recorded(), vec![PACING; 3]);
}

#[tokio::test]
async fn test_second_run_converges_on_same_state() {
    let server = MockServer::start().await;
    mount_catalogue(&server, 2).await;
    let store = Arc::new(MemoryStore::new());

    for _ in 0..2 {
        engine(&server, &[], store.clone(), RecordingPause::new())
            .run(Phases::All)
            .await
            .unwrap();
    }

    assert_eq!(store.rows(&table("imoveis")).len(), 3);
    assert_eq!(store.rows(&table("imovel_prontuario")).len(), 2);
}

#[tokio::test]
async fn test_rate_limited_page_is_retried_after_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many connections"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing_pages(&server, vec![vec![listing("A1", "Casa")]], 1).await;
    let store = Arc::new(MemoryStore::new());
    let pause = RecordingPause::new();

    let report = engine(&server, &[], store.clone(), pause.clone())
        .run(Phases::ListingsOnly)
        .await
        .unwrap();

    assert_eq!(report.listings.unwrap().upsert.written, 1);
    assert!(report.history.is_none());
    assert_eq!(pause.recorded(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn test_listing_failure_aborts_before_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    let store = Arc::new(MemoryStore::new());

    let result = engine(
        &server,
        &[("MAX_RETRIES_API", "2")],
        store.clone(),
        RecordingPause::new(),
    )
    .run(Phases::All)
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("listing page 1"), "{}", err);
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn test_history_only_isolates_exhausted_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("imovel", "B1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(2)
        .mount(&server)
        .await;
    mount_detail(
        &server,
        "B2",
        ResponseTemplate::new(200)
            .set_body_json(detail_body("B2", &[("5", json!({ "Assunto": "Ligação" }))])),
    )
    .await;

    let key = ConflictKey::single(ColumnName::new("codigo").unwrap());
    let seeded: Vec<Row> = ["B1", "B2"]
        .iter()
        .map(|code| {
            let mut row = Row::new();
            row.insert("codigo".to_string(), json!(code));
            row
        })
        .collect();
    let store = Arc::new(MemoryStore::new().with_rows(&table("imoveis"), seeded, &key));
    let pause = RecordingPause::new();

    let report = engine(
        &server,
        &[("MAX_RETRIES_API", "2")],
        store.clone(),
        pause.clone(),
    )
    .run(Phases::HistoryOnly)
    .await
    .unwrap();

    assert!(report.listings.is_none());
    let history = report.history.unwrap();
    assert_eq!(history.enumerated, 2);
    assert_eq!(history.with_history, 1);
    assert_eq!(history.skipped.len(), 1);
    assert_eq!(history.skipped[0].code.as_str(), "B1");

    let rows = store.rows(&table("imovel_prontuario"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["codigo_imovel"], json!("B2"));
    assert_eq!(rows[0]["codigo_prontuario"], json!(5));

    // Backoff after the first failed attempt only, then pacing per listing.
    assert_eq!(
        pause.recorded(),
        vec![Duration::from_secs(3), PACING, PACING]
    );
}
