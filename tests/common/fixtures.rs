//! Static product corpora used across harnesses.

use serde_json::{json, Value};

/// A small apparel catalogue. Ids 1-3 are the outerwear used in the
/// jacket/coat/sweater scenarios.
pub fn catalog() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Denim Jacket", "brand": "Acme", "category": "outerwear",
                "gender": "women", "price": 60, "description": "A light jacket for spring" }),
        json!({ "id": 2, "name": "Waxed Jacket Coat", "brand": "Northwind", "category": "outerwear",
                "gender": "men", "price": 180, "description": "Part jacket, part coat, fully waterproof" }),
        json!({ "id": 3, "name": "Wool Coat", "brand": "Acme", "category": "outerwear",
                "gender": "women", "price": 220, "description": "Long wool coat with a belt" }),
        json!({ "id": 4, "name": "Rain Boots", "brand": "Puddle", "category": "footwear",
                "gender": "unisex", "price": 45, "description": "Rubber boots for wet days" }),
        json!({ "id": 5, "name": "Running Shoes", "brand": "Northwind", "category": "footwear",
                "gender": "men", "price": 95, "description": "Cushioned shoes for long runs" }),
        json!({ "id": 6, "name": "Cable Knit", "brand": "Loom", "category": "knitwear",
                "gender": "women", "price": 75, "description": "Chunky cable knit, warmer than a sweater" }),
    ]
}

/// A canned Meilisearch answer for the fake HTTP server.
pub fn meili_answer(ids: &[u64]) -> Value {
    json!({
        "hits": ids.iter().map(|id| json!({ "id": id, "name": format!("product {id}") })).collect::<Vec<_>>(),
        "query": "ignored",
        "processingTimeMs": 2,
        "limit": 20,
        "offset": 0,
        "estimatedTotalHits": ids.len(),
        "facetDistribution": { "brand": { "acme": ids.len() } }
    })
}
