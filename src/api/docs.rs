// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAPI document and Swagger UI page

use axum::{response::Html, Json};
use serde_json::{json, Value};

use crate::api::handlers::{
    CLASSIFICATION_UNAVAILABLE, GENERATION_UNAVAILABLE, SUMMARIZATION_UNAVAILABLE,
};
use crate::version;

pub const OPENAPI_PATH: &str = "/openapi.json";

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Text Analysis API - Swagger UI</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

fn error_ref() -> Value {
    json!({ "$ref": "#/components/schemas/ErrorResponse" })
}

fn json_content(schema: Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn text_operation(summary: &str, response_schema: &str, unavailable: Option<&str>) -> Value {
    let mut responses = json!({
        "200": {
            "description": "Successful response",
            "content": json_content(json!({ "$ref": format!("#/components/schemas/{}", response_schema) })),
        },
        "422": { "description": "Validation error", "content": json_content(error_ref()) },
        "413": { "description": "Request body too large", "content": json_content(error_ref()) },
        "500": { "description": "Pipeline error", "content": json_content(error_ref()) },
    });
    if let Some(detail) = unavailable {
        responses["503"] = json!({ "description": detail, "content": json_content(error_ref()) });
    }

    json!({
        "post": {
            "summary": summary,
            "requestBody": {
                "required": true,
                "content": json_content(json!({ "$ref": "#/components/schemas/TextInput" })),
            },
            "responses": responses,
        }
    })
}

fn get_operation(summary: &str, response_schema: &str) -> Value {
    json!({
        "get": {
            "summary": summary,
            "responses": {
                "200": {
                    "description": "Successful response",
                    "content": json_content(json!({ "$ref": format!("#/components/schemas/{}", response_schema) })),
                }
            }
        }
    })
}

fn string_props(names: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = names
        .iter()
        .map(|n| (n.to_string(), json!({ "type": "string" })))
        .collect();
    Value::Object(props)
}

/// Builds the OpenAPI 3.0 document describing every route
pub fn openapi_document() -> Value {
    let labelled = |text_field: &str, label_field: &str| {
        json!({
            "type": "object",
            "required": [text_field, label_field, "confidence"],
            "properties": {
                text_field: { "type": "string" },
                label_field: { "type": "string" },
                "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            }
        })
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Text Analysis API",
            "description": "Sentiment analysis, text generation, summarization and classification",
            "version": version::VERSION_NUMBER,
            "x-build": version::get_version_info(),
        },
        "paths": {
            "/": get_operation("Welcome message", "RootResponse"),
            "/sentiment": text_operation("Analyze sentiment", "SentimentResponse", None),
            "/generate": text_operation("Generate text", "GenerateResponse", Some(GENERATION_UNAVAILABLE)),
            "/classify": text_operation("Classify text", "ClassifyResponse", Some(CLASSIFICATION_UNAVAILABLE)),
            "/summarize": text_operation("Summarize text", "SummarizeResponse", Some(SUMMARIZATION_UNAVAILABLE)),
            "/health": get_operation("Health check", "HealthResponse"),
            "/models": get_operation("Pipeline availability", "ModelsResponse"),
        },
        "components": {
            "schemas": {
                "TextInput": {
                    "type": "object",
                    "required": ["text"],
                    "properties": string_props(&["text"]),
                },
                "RootResponse": { "type": "object", "properties": string_props(&["message", "docs"]) },
                "SentimentResponse": labelled("text", "sentiment"),
                "GenerateResponse": {
                    "type": "object",
                    "required": ["prompt", "generated_text"],
                    "properties": string_props(&["prompt", "generated_text"]),
                },
                "ClassifyResponse": labelled("text", "category"),
                "SummarizeResponse": {
                    "oneOf": [
                        {
                            "type": "object",
                            "required": ["original_text", "summary"],
                            "properties": string_props(&["original_text", "summary"]),
                        },
                        {
                            "type": "object",
                            "required": ["summary", "note"],
                            "properties": string_props(&["summary", "note"]),
                        }
                    ]
                },
                "HealthResponse": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string" },
                        "timestamp": { "type": "number" },
                    }
                },
                "ModelsResponse": {
                    "type": "object",
                    "properties": {
                        "models": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "task": {
                                        "type": "string",
                                        "enum": ["sentiment", "generation", "summarization", "classification"],
                                    },
                                    "name": { "type": "string" },
                                    "available": { "type": "boolean" },
                                }
                            }
                        }
                    }
                },
                "ErrorResponse": {
                    "type": "object",
                    "required": ["detail", "error_type"],
                    "properties": string_props(&["detail", "error_type"]),
                },
            }
        }
    })
}

/// GET /openapi.json
pub async fn openapi_handler() -> Json<Value> {
    Json(openapi_document())
}

/// GET /docs
pub async fn swagger_ui_handler() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}
