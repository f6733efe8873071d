// tests/integration/snapshot_export.rs
//! The CSV snapshot written from the fake listing endpoint.

use super::fake_vista::{listing_page, mount_listing_pages, LISTING_PATH};
use crate::common::api_config;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use vista_sync::{export_snapshot, RecordingPause, RetryPolicy, VistaHttpClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn export_to(server: &MockServer, file: &std::path::Path) -> usize {
    let config = api_config(&server.uri());
    let transport = Arc::new(VistaHttpClient::new(config.timeout).unwrap());
    let policy = RetryPolicy::new(config.max_attempts, Arc::new(RecordingPause::new()));
    export_snapshot(transport, policy, &config, file).await.unwrap()
}

#[tokio::test]
async fn test_export_writes_bom_header_and_rows() {
    let server = MockServer::start().await;
    mount_listing_pages(
        &server,
        vec![
            vec![
                json!({
                    "Codigo": "A1",
                    "Categoria": "Apartamento",
                    "Bairro": "Centro",
                    "Status": "Venda",
                    "Orulo": "Nao",
                    "DataHoraAtualizacao": "2024-05-02 09:15:00",
                    "PendenteProntuario": "Sim",
                    "DataDeAtivacao": "0000-00-00 00:00:00",
                    "DataAtualizacao": "2024-05-02"
                }),
                json!({ "Codigo": "A2", "Bairro": "Jardim \"Sul\"" }),
            ],
            vec![json!({ "Codigo": "A3" })],
        ],
        1,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("imoveis.csv");

    let written = export_to(&server, &file).await;

    assert_eq!(written, 3);
    let bytes = std::fs::read(&file).unwrap();
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "codigoimovel,categoria,bairro,status,orulo,datahoraatualizacao,pendenteprontuario,datadeativacao,dataatualizacao",
            "A1,Apartamento,Centro,Venda,Nao,2024-05-02 09:15:00,Sim,,2024-05-02",
            "A2,,\"Jardim \"\"Sul\"\"\",,,,,,",
            "A3,,,,,,,,",
        ]
    );
}

#[tokio::test]
async fn test_export_without_listings_writes_nothing() {
    let server = MockServer::start().await;
    let empty: Vec<Value> = Vec::new();
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_page(&empty, 1, 0)))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("imoveis.csv");

    let written = export_to(&server, &file).await;

    assert_eq!(written, 0);
    assert!(!file.exists());
}
