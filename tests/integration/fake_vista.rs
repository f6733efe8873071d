// tests/integration/fake_vista.rs
//! A wiremock stand-in for the Vista listing and detail endpoints.

use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const LISTING_PATH: &str = "/imoveis/listar";
pub const DETAIL_PATH: &str = "/imoveis/detalhes";

/// Matches listing requests for one page number of the `pesquisa` payload.
pub struct PageNumber(pub u64);

impl Match for PageNumber {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .find(|(name, _)| name == "pesquisa")
            .and_then(|(_, raw)| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|search| search["paginacao"]["pagina"].as_u64())
            == Some(self.0)
    }
}

/// A listing page body: items keyed by code plus the pagination members.
pub fn listing_page(items: &[Value], page: u64, total_pages: u64) -> Value {
    let mut body = Map::new();
    for item in items {
        let key = item["Codigo"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| item["Codigo"].to_string());
        body.insert(key, item.clone());
    }
    body.insert("total".to_string(), json!(items.len()));
    body.insert("paginas".to_string(), json!(total_pages));
    body.insert("pagina".to_string(), json!(page));
    body.insert("quantidade".to_string(), json!(items.len()));
    Value::Object(body)
}

/// Serves `pages` in order; each page must be requested `times` times.
pub async fn mount_listing_pages(server: &MockServer, pages: Vec<Vec<Value>>, times: u64) {
    let total = pages.len() as u64;
    for (index, items) in pages.into_iter().enumerate() {
        let number = index as u64 + 1;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("key", "test-key"))
            .and(PageNumber(number))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(listing_page(&items, number, total)),
            )
            .expect(times)
            .mount(server)
            .await;
    }
}

/// Serves a fixed detail response for one listing code.
pub async fn mount_detail(server: &MockServer, code: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("imovel", code))
        .respond_with(response)
        .mount(server)
        .await;
}

/// A detail body whose `prontuarios` holds `entries` keyed as given.
pub fn detail_body(code: &str, entries: &[(&str, Value)]) -> Value {
    let history: Map<String, Value> = entries
        .iter()
        .map(|(key, entry)| (key.to_string(), entry.clone()))
        .collect();
    json!({ "Codigo": code, "prontuarios": history })
}

/// The 400 the API answers for listings without history.
pub fn no_history() -> ResponseTemplate {
    ResponseTemplate::new(400)
        .set_body_json(json!({ "message": "A pesquisa não retornou prontuarios" }))
}
