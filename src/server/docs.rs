//! Interactive API docs.
//!
//! `/` redirects to the docs page, which renders the OpenAPI document served
//! at `/openapi.json` with Swagger UI.

use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

const DOCS_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>ollama-relay</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <noscript>
    <h1>ollama-relay</h1>
    <ul>
      <li><code>GET /ask?prompt=...</code> generate a response</li>
      <li><code>POST /pull</code> with <code>{"name": "..."}</code> pull a model</li>
      <li><code>GET /health</code>, <code>GET /metrics</code></li>
    </ul>
  </noscript>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}

pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

/// OpenAPI 3 description of the caller-facing API.
pub fn openapi_document() -> Value {
    let error = json!({
        "description": "Backing server failure",
        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "ollama-relay",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Relays prompts and model pulls to a local Ollama server."
        },
        "paths": {
            "/ask": {
                "get": {
                    "summary": "Generate a response from the model",
                    "parameters": [{
                        "name": "prompt",
                        "in": "query",
                        "required": true,
                        "schema": {"type": "string"}
                    }],
                    "responses": {
                        "200": {
                            "description": "Model output",
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"response": {"type": "string"}}
                            }}}
                        },
                        "500": error.clone(),
                        "504": {"description": "Backing server timed out"}
                    }
                }
            },
            "/pull": {
                "post": {
                    "summary": "Pull a model onto the backing server",
                    "requestBody": {
                        "required": true,
                        "content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {"name": {"type": "string"}}
                        }}}
                    },
                    "responses": {
                        "200": {
                            "description": "Model downloaded",
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"message": {"type": "string"}}
                            }}}
                        },
                        "500": error,
                        "504": {"description": "Backing server timed out"}
                    }
                }
            },
            "/health": {
                "get": {"summary": "Relay and backing server status", "responses": {"200": {"description": "Status"}}}
            },
            "/metrics": {
                "get": {"summary": "Prometheus metrics", "responses": {"200": {"description": "Text exposition"}}}
            }
        },
        "components": {
            "schemas": {
                "Error": {
                    "type": "object",
                    "properties": {"detail": {"type": "string"}}
                }
            }
        }
    })
}
