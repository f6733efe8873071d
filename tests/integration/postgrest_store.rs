// tests/integration/postgrest_store.rs
//! A production-wired engine talking to fake Vista and PostgREST servers.

use super::fake_vista::{detail_body, mount_detail, mount_listing_pages, no_history};
use crate::common::sync_config;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use vista_sync::{Phases, SyncEngine};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_row(code: &str, category: &str) -> Value {
    json!({
        "codigo": code,
        "categoria": category,
        "bairro": null,
        "status": null,
        "orulo": null,
        "exibirnosite": null,
        "datacadastro": null,
        "datadeativacao": null,
        "dataatualizacao": null,
    })
}

#[tokio::test]
async fn test_sync_through_postgrest_counts_rejected_batch() {
    let api = MockServer::start().await;
    let store = MockServer::start().await;

    mount_listing_pages(
        &api,
        vec![
            vec![
                json!({ "Codigo": "A1", "Categoria": "Casa" }),
                json!({ "Codigo": "A2", "Categoria": "Sala" }),
            ],
            vec![json!({ "Codigo": "A3", "Categoria": "Loja" })],
        ],
        1,
    )
    .await;
    mount_detail(
        &api,
        "A1",
        ResponseTemplate::new(200)
            .set_body_json(detail_body("A1", &[("1", json!({ "Assunto": "Visita" }))])),
    )
    .await;
    mount_detail(&api, "A2", no_history()).await;

    let first_batch = json!([listing_row("A1", "Casa"), listing_row("A2", "Sala")]);
    Mock::given(method("POST"))
        .and(path("/rest/v1/imoveis"))
        .and(query_param("on_conflict", "codigo"))
        .and(header("apikey", "service-role-key"))
        .and(body_json(&first_batch))
        .respond_with(ResponseTemplate::new(201).set_body_json(&first_batch))
        .expect(1)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/imoveis"))
        .and(body_json(json!([listing_row("A3", "Loja")])))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "conflict on codigo" })),
        )
        .expect(1)
        .mount(&store)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/imoveis"))
        .and(query_param("select", "codigo"))
        .and(query_param("order", "codigo.asc"))
        .and(header("Range", "0-999"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "codigo": "A1" }, { "codigo": "A2" }])),
        )
        .expect(1)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/imovel_prontuario"))
        .and(query_param("on_conflict", "codigo_imovel,codigo_prontuario"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "codigo_imovel": "A1", "codigo_prontuario": 1 }
        ])))
        .expect(1)
        .mount(&store)
        .await;

    let config = sync_config(
        &api.uri(),
        &[
            ("SUPABASE_URL", store.uri().as_str()),
            ("UPSERT_BATCH_SIZE", "2"),
            ("SLEEP_ENTRE_REQ", "0"),
        ],
    );
    let report = SyncEngine::from_config(config)
        .unwrap()
        .run(Phases::All)
        .await
        .unwrap();

    let listings = report.listings.clone().unwrap();
    assert_eq!(listings.fetched, 3);
    assert_eq!(listings.upsert.batches, 2);
    assert_eq!(listings.upsert.written, 2);
    assert_eq!(listings.upsert.failed_batches, 1);

    let history = report.history.clone().unwrap();
    assert_eq!(history.enumerated, 2);
    assert_eq!(history.with_history, 1);
    assert_eq!(history.without_history, 1);
    assert_eq!(history.upsert.written, 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_unreadable_store_aborts_history_phase() {
    let api = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/imoveis"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&store)
        .await;

    let config = sync_config(&api.uri(), &[("SUPABASE_URL", store.uri().as_str())]);
    let err = SyncEngine::from_config(config)
        .unwrap()
        .run(Phases::HistoryOnly)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid API key"), "{}", err);
    assert!(!err.is_isolatable());
}
