use super::*;
use crate::config::StorefrontConfig;
use crate::net::test_helpers::ScriptedTransport;
use crate::session::{MemoryTokenStore, SessionState};
use serde_json::json;

fn service(token: Option<&str>) -> (Arc<ScriptedTransport>, Arc<SessionState>, CatalogService) {
    let store = token.map_or_else(MemoryTokenStore::new, |t| MemoryTokenStore::with_value("csrf_token", t));
    let config = StorefrontConfig::default();
    let state = Arc::new(SessionState::new(Arc::new(store), "csrf_token").unwrap());
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = Arc::new(Gateway::new(transport.clone(), state.clone(), &config));
    (transport, state, CatalogService::new(gateway, config.endpoints.catalog))
}

#[tokio::test]
async fn garments_parse_listing() {
    let (transport, _, catalog) = service(Some("abc"));
    transport.respond(
        200,
        json!({"success": true, "data": [{
            "id": 1,
            "image": "/media/1.jpg",
            "size": "S",
            "count": 4,
            "category": {"id": 2, "name": "Aprons"},
            "color": {"id": 3, "name": "Linen", "color": "#e9e4d4"}
        }]}),
    );

    let garments = catalog.garments().await.unwrap();

    assert_eq!(garments.len(), 1);
    assert_eq!(garments[0].category.name, "Aprons");
    let req = &transport.requests()[0];
    assert_eq!(req.method, reqwest::Method::GET);
    assert!(req.url.ends_with("/api/v1/catalog/garments/"));
    assert_eq!(req.headers.get("x-csrf-token").unwrap(), "abc");
}

#[tokio::test]
async fn categories_and_colors_hit_their_endpoints() {
    let (transport, _, catalog) = service(None);
    transport.respond(200, json!({"success": true, "data": [{"id": 1, "name": "Shirts"}]}));
    transport.respond(200, json!({"success": true, "data": [{"id": 5, "name": "Blue", "color": "#0000ff"}]}));

    assert_eq!(catalog.categories().await.unwrap()[0].name, "Shirts");
    assert_eq!(catalog.colors().await.unwrap()[0].color, "#0000ff");

    let reqs = transport.requests();
    assert!(reqs[0].url.ends_with("/api/v1/catalog/categories/"));
    assert!(reqs[1].url.ends_with("/api/v1/catalog/colors/"));
}

#[tokio::test]
async fn missing_data_is_empty_listing() {
    let (transport, _, catalog) = service(None);
    transport.respond(200, json!({"success": true}));
    assert!(catalog.colors().await.unwrap().is_empty());
}

#[tokio::test]
async fn failure_envelope_is_general_error() {
    let (transport, _, catalog) = service(None);
    transport.respond(400, json!({"success": false, "error": {"message": "Catalog unavailable"}}));
    assert!(matches!(catalog.garments().await, Err(AuthError::General(m)) if m == "Catalog unavailable"));
}

#[tokio::test]
async fn unauthorized_listing_drops_session() {
    let (transport, state, catalog) = service(Some("abc"));
    transport.respond(401, json!({}));

    assert!(matches!(catalog.garments().await, Err(AuthError::Unauthorized)));
    assert!(!state.is_authenticated());
    assert!(state.token().unwrap().is_none());
}
