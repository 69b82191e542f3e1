//! Built-in tool set.
//!
//! Five tools over the retrieval pipeline: `add_documents`,
//! `search_documents`, `rag_answer`, `index_info`, and `clear_index`.
//! Argument schemas mirror what `tools/list` advertises; handlers only ever
//! see arguments the schema accepted.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use ragd_core::{RagError, Result, SearchHits};
use ragd_pipeline::{RetrievalPipeline, SplitConfig};

use crate::registry::{ToolDescriptor, ToolFailure, ToolHandler, ToolRegistry, ToolResult};
use crate::schema::{InputSchema, PropKind, PropSchema};

/// Register the standard ragd tools against a shared pipeline.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    pipeline: Arc<RetrievalPipeline>,
) -> Result<()> {
    registry.register(add_documents_descriptor(), add_documents_handler(pipeline.clone()))?;
    registry.register(search_documents_descriptor(), search_documents_handler(pipeline.clone()))?;
    registry.register(rag_answer_descriptor(), rag_answer_handler(pipeline.clone()))?;
    registry.register(index_info_descriptor(), index_info_handler(pipeline.clone()))?;
    registry.register(clear_index_descriptor(), clear_index_handler(pipeline))?;
    Ok(())
}

fn add_documents_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "add_documents".to_string(),
        description: "Split texts into chunks, embed them, and add them to the index".to_string(),
        input_schema: InputSchema::new()
            .property(
                "texts",
                PropSchema::array(PropKind::String, "Document texts to ingest"),
                true,
            )
            .property(
                "metadatas",
                PropSchema::array(PropKind::Object, "Optional per-text metadata objects"),
                false,
            )
            .property(
                "chunk_size",
                PropSchema::integer("Maximum chunk size in characters")
                    .minimum(1)
                    .default_value(json!(1000)),
                false,
            )
            .property(
                "chunk_overlap",
                PropSchema::integer("Overlap between adjacent chunks in characters")
                    .minimum(0)
                    .default_value(json!(200)),
                false,
            ),
    }
}

fn add_documents_handler(pipeline: Arc<RetrievalPipeline>) -> ToolHandler {
    Arc::new(move |args| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            let texts: Vec<String> = args["texts"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            let metadatas: Option<Vec<HashMap<String, Value>>> =
                args.get("metadatas").and_then(Value::as_array).map(|items| {
                    items
                        .iter()
                        .map(|m| {
                            m.as_object()
                                .map(|obj| obj.clone().into_iter().collect())
                                .unwrap_or_default()
                        })
                        .collect()
                });

            let chunk_size = int_arg(&args, "chunk_size", 1000);
            let chunk_overlap = int_arg(&args, "chunk_overlap", 200);
            if chunk_overlap >= chunk_size {
                return Err(RagError::invalid_argument(
                    "chunk_overlap must be smaller than chunk_size",
                )
                .into());
            }

            let report = pipeline
                .add_documents(
                    &texts,
                    metadatas.as_deref(),
                    Some(SplitConfig {
                        chunk_size,
                        chunk_overlap,
                    }),
                )
                .await;

            to_json(&report)
        })
    })
}

fn search_documents_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "search_documents".to_string(),
        description: "Similarity search over the indexed documents".to_string(),
        input_schema: InputSchema::new()
            .property("query", PropSchema::string("Search query"), true)
            .property(
                "k",
                PropSchema::integer("Number of results to return")
                    .minimum(0)
                    .default_value(json!(4)),
                false,
            ),
    }
}

fn search_documents_handler(pipeline: Arc<RetrievalPipeline>) -> ToolHandler {
    Arc::new(move |args| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            let query = str_arg(&args, "query");
            let k = int_arg(&args, "k", 4);

            let hits = pipeline.search(&query, k).await?;
            Ok(json!({ "results": hits_json(&hits) }))
        })
    })
}

fn rag_answer_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "rag_answer".to_string(),
        description: "Retrieve relevant documents and generate an answer from them".to_string(),
        input_schema: InputSchema::new()
            .property("question", PropSchema::string("Question to answer"), true)
            .property(
                "k",
                PropSchema::integer("Number of documents to retrieve")
                    .minimum(0)
                    .default_value(json!(4)),
                false,
            ),
    }
}

fn rag_answer_handler(pipeline: Arc<RetrievalPipeline>) -> ToolHandler {
    Arc::new(move |args| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            let question = str_arg(&args, "question");
            let k = int_arg(&args, "k", 4);

            let sources = pipeline.search(&question, k).await?;
            if sources.hits.is_empty() {
                return Err(RagError::EmptyIndex.into());
            }

            match pipeline.generate_from(&question, &sources).await {
                Ok(answer) => Ok(json!({
                    "answer": answer,
                    "sources": hits_json(&sources),
                })),
                // Retrieval succeeded; keep its result available to the
                // client even though generation did not.
                Err(error) => Err(ToolFailure {
                    data: Some(json!({ "sources": hits_json(&sources) })),
                    error,
                }),
            }
        })
    })
}

fn index_info_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "index_info".to_string(),
        description: "Report index size, similarity metric, and embedding dimension".to_string(),
        input_schema: InputSchema::new(),
    }
}

fn index_info_handler(pipeline: Arc<RetrievalPipeline>) -> ToolHandler {
    Arc::new(move |args| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            let _ = args;
            let index = pipeline.index();
            Ok(json!({
                "document_count": index.count().await,
                "metric": index.metric().to_string(),
                "dimension": index.dimension(),
            }))
        })
    })
}

fn clear_index_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "clear_index".to_string(),
        description: "Remove every document from the index; requires confirm=true".to_string(),
        input_schema: InputSchema::new().property(
            "confirm",
            PropSchema::boolean("Must be true to actually clear the index"),
            true,
        ),
    }
}

fn clear_index_handler(pipeline: Arc<RetrievalPipeline>) -> ToolHandler {
    Arc::new(move |args| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            if args["confirm"] != json!(true) {
                return Ok(json!({ "cleared": false, "removed": 0 }));
            }

            let removed = pipeline.index().clear().await;
            Ok(json!({ "cleared": true, "removed": removed }))
        })
    })
}

fn hits_json(hits: &SearchHits) -> Vec<Value> {
    hits.hits
        .iter()
        .map(|hit| {
            json!({
                "id": hit.document.id.to_string(),
                "text": hit.document.text,
                "score": hit.score,
                "rank": hit.rank,
                "metadata": hit.document.metadata,
            })
        })
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> ToolResult {
    serde_json::to_value(value).map_err(|e| ToolFailure::from(RagError::from(e)))
}

fn str_arg(args: &Value, name: &str) -> String {
    args[name].as_str().unwrap_or_default().to_string()
}

fn int_arg(args: &Value, name: &str, default: usize) -> usize {
    args.get(name)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragd_core::{Embedder, Generator, RagdConfig};
    use ragd_embed::{ExtractiveGenerator, HashEmbedder};
    use ragd_index::{Metric, VectorIndex};

    fn registry() -> ToolRegistry {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let generator: Arc<dyn Generator> = Arc::new(ExtractiveGenerator::new());
        let index = Arc::new(VectorIndex::new(embedder, Metric::Cosine));
        let pipeline = Arc::new(RetrievalPipeline::new(index, generator, &RagdConfig::default()));

        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry, pipeline).unwrap();
        registry
    }

    #[test]
    fn test_all_builtins_registered() {
        let registry = registry();
        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["add_documents", "search_documents", "rag_answer", "index_info", "clear_index"]
        );
    }

    #[tokio::test]
    async fn test_add_then_search() {
        let registry = registry();

        let report = registry
            .invoke(
                "add_documents",
                json!({"texts": ["the quick brown fox", "an unrelated sentence"]}),
            )
            .await
            .unwrap();
        assert_eq!(report["added"], json!(2));
        assert_eq!(report["failed"], json!([]));

        let result = registry
            .invoke("search_documents", json!({"query": "quick brown fox", "k": 1}))
            .await
            .unwrap();
        let results = result["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["text"], "the quick brown fox");
        assert_eq!(results[0]["rank"], json!(1));
    }

    #[tokio::test]
    async fn test_add_documents_rejects_bad_overlap() {
        let registry = registry();
        let failure = registry
            .invoke(
                "add_documents",
                json!({"texts": ["x"], "chunk_size": 100, "chunk_overlap": 100}),
            )
            .await
            .unwrap_err();
        assert!(matches!(failure.error, RagError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let registry = registry();
        let failure = registry.invoke("search_documents", json!({})).await.unwrap_err();
        assert!(matches!(failure.error, RagError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_search_rejects_negative_k() {
        let registry = registry();
        let failure = registry
            .invoke("search_documents", json!({"query": "x", "k": -2}))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, RagError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_rag_answer_empty_index() {
        let registry = registry();
        let failure = registry
            .invoke("rag_answer", json!({"question": "anything?"}))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, RagError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_rag_answer_over_two_documents() {
        let registry = registry();
        registry
            .invoke(
                "add_documents",
                json!({"texts": [
                    "RAG combines retrieval with generation.",
                    "A vector database stores embeddings."
                ]}),
            )
            .await
            .unwrap();

        let result = registry
            .invoke("rag_answer", json!({"question": "What is RAG?", "k": 1}))
            .await
            .unwrap();
        assert!(result["answer"].as_str().unwrap().contains("retrieval"));
        let sources = result["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0]["text"], "RAG combines retrieval with generation.");
    }

    #[tokio::test]
    async fn test_index_info_and_clear() {
        let registry = registry();
        registry
            .invoke("add_documents", json!({"texts": ["one", "two"]}))
            .await
            .unwrap();

        let info = registry.invoke("index_info", json!({})).await.unwrap();
        assert_eq!(info["document_count"], json!(2));
        assert_eq!(info["metric"], "cosine");
        assert_eq!(info["dimension"], json!(384));

        let refused = registry
            .invoke("clear_index", json!({"confirm": false}))
            .await
            .unwrap();
        assert_eq!(refused, json!({"cleared": false, "removed": 0}));

        let cleared = registry
            .invoke("clear_index", json!({"confirm": true}))
            .await
            .unwrap();
        assert_eq!(cleared, json!({"cleared": true, "removed": 2}));

        let info = registry.invoke("index_info", json!({})).await.unwrap();
        assert_eq!(info["document_count"], json!(0));
    }

    #[tokio::test]
    async fn test_clear_requires_confirm_argument() {
        let registry = registry();
        let failure = registry.invoke("clear_index", json!({})).await.unwrap_err();
        assert!(matches!(failure.error, RagError::Validation { .. }));
    }
}
