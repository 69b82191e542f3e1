//! End-to-end protocol tests: raw JSON-RPC bytes in, SSE frames out.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use ragd_core::{Embedder, Generator, RagdConfig};
use ragd_embed::{ExtractiveGenerator, HashEmbedder};
use ragd_index::{Metric, VectorIndex};
use ragd_pipeline::RetrievalPipeline;
use ragd_rpc::{
    register_builtin_tools, spawn_session, SessionDispatcher, ToolRegistry, PROTOCOL_VERSION,
};

fn dispatcher() -> Arc<SessionDispatcher> {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
    let generator: Arc<dyn Generator> = Arc::new(ExtractiveGenerator::new());
    let index = Arc::new(VectorIndex::new(embedder, Metric::Cosine));
    let pipeline = Arc::new(RetrievalPipeline::new(index, generator, &RagdConfig::default()));

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, pipeline).unwrap();
    Arc::new(SessionDispatcher::new(Arc::new(registry), "ragd", "0.1.0"))
}

/// Send one message and decode the SSE frame that comes back.
async fn roundtrip(
    tx: &mpsc::Sender<Vec<u8>>,
    rx: &mut mpsc::Receiver<Vec<u8>>,
    message: Value,
) -> Value {
    tx.send(message.to_string().into_bytes()).await.unwrap();
    decode_frame(rx.recv().await.expect("expected a response frame"))
}

fn decode_frame(frame: Vec<u8>) -> Value {
    let text = String::from_utf8(frame).unwrap();
    assert!(text.starts_with("event: message\n"), "not an SSE message: {}", text);
    let data: String = text
        .lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .collect::<Vec<_>>()
        .join("\n");
    serde_json::from_str(&data).unwrap()
}

fn request(id: Value, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[tokio::test]
async fn initialize_then_list_tools() {
    let (tx, mut rx) = spawn_session(dispatcher());

    let init = roundtrip(&tx, &mut rx, request(json!(1), "initialize", json!({}))).await;
    assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(init["result"]["serverInfo"]["name"], "ragd");

    let list = roundtrip(&tx, &mut rx, request(json!(2), "tools/list", json!({}))).await;
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[0]["name"], "add_documents");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");

    // The manifest is stable across calls.
    let again = roundtrip(&tx, &mut rx, request(json!(3), "tools/list", json!({}))).await;
    assert_eq!(again["result"], list["result"]);
}

#[tokio::test]
async fn request_id_types_are_echoed() {
    let (tx, mut rx) = spawn_session(dispatcher());

    let by_number = roundtrip(&tx, &mut rx, request(json!(42), "ping", json!({}))).await;
    assert_eq!(by_number["id"], json!(42));

    let by_string = roundtrip(&tx, &mut rx, request(json!("req-1"), "ping", json!({}))).await;
    assert_eq!(by_string["id"], json!("req-1"));
}

#[tokio::test]
async fn protocol_error_codes() {
    let (tx, mut rx) = spawn_session(dispatcher());

    // -32700: invalid JSON, null id.
    tx.send(b"{broken".to_vec()).await.unwrap();
    let parse = decode_frame(rx.recv().await.unwrap());
    assert_eq!(parse["error"]["code"], json!(-32700));
    assert_eq!(parse["id"], Value::Null);

    // -32600: structurally invalid envelope.
    tx.send(json!({"id": 1, "method": "ping"}).to_string().into_bytes())
        .await
        .unwrap();
    let invalid = decode_frame(rx.recv().await.unwrap());
    assert_eq!(invalid["error"]["code"], json!(-32600));

    // -32601: unknown method.
    let unknown = roundtrip(&tx, &mut rx, request(json!(2), "prompts/list", json!({}))).await;
    assert_eq!(unknown["error"]["code"], json!(-32601));

    // -32602: tools/call without a tool name.
    let no_name = roundtrip(&tx, &mut rx, request(json!(3), "tools/call", json!({}))).await;
    assert_eq!(no_name["error"]["code"], json!(-32602));

    // The session is still healthy after every failure above.
    let pong = roundtrip(&tx, &mut rx, request(json!(4), "ping", json!({}))).await;
    assert_eq!(pong["result"], json!({}));
}

#[tokio::test]
async fn unknown_tool_leaves_session_usable() {
    let (tx, mut rx) = spawn_session(dispatcher());

    let missing = roundtrip(
        &tx,
        &mut rx,
        request(json!(1), "tools/call", json!({"name": "bogus_tool"})),
    )
    .await;
    assert_eq!(missing["error"]["code"], json!(-32602));
    assert!(missing["error"]["message"]
        .as_str()
        .unwrap()
        .contains("bogus_tool"));

    let list = roundtrip(&tx, &mut rx, request(json!(2), "tools/list", json!({}))).await;
    assert!(list["result"]["tools"].is_array());
}

#[tokio::test]
async fn notifications_get_no_response() {
    let (tx, mut rx) = spawn_session(dispatcher());

    tx.send(
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
            .to_string()
            .into_bytes(),
    )
    .await
    .unwrap();

    // The next frame on the wire belongs to the ping, not the notification.
    let pong = roundtrip(&tx, &mut rx, request(json!(1), "ping", json!({}))).await;
    assert_eq!(pong["id"], json!(1));
}

#[tokio::test]
async fn full_rag_scenario() {
    let (tx, mut rx) = spawn_session(dispatcher());

    let call = |id: i64, name: &str, arguments: Value| {
        request(
            json!(id),
            "tools/call",
            json!({"name": name, "arguments": arguments}),
        )
    };

    let added = roundtrip(
        &tx,
        &mut rx,
        call(
            1,
            "add_documents",
            json!({"texts": [
                "RAG combines retrieval with generation.",
                "A vector database stores embeddings."
            ]}),
        ),
    )
    .await;
    assert_eq!(added["result"]["added"], json!(2));
    assert_eq!(added["result"]["ids"].as_array().unwrap().len(), 2);

    let found = roundtrip(
        &tx,
        &mut rx,
        call(2, "search_documents", json!({"query": "What is RAG?", "k": 1})),
    )
    .await;
    let results = found["result"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["text"], "RAG combines retrieval with generation.");

    let answered = roundtrip(
        &tx,
        &mut rx,
        call(3, "rag_answer", json!({"question": "What is RAG?", "k": 1})),
    )
    .await;
    assert!(answered["result"]["answer"]
        .as_str()
        .unwrap()
        .contains("retrieval"));

    let info = roundtrip(&tx, &mut rx, call(4, "index_info", json!({}))).await;
    assert_eq!(info["result"]["document_count"], json!(2));

    // Validation error: empty query.
    let empty = roundtrip(
        &tx,
        &mut rx,
        call(5, "search_documents", json!({"query": "   "})),
    )
    .await;
    assert_eq!(empty["error"]["code"], json!(-32602));

    // k = 0 is an empty result, not an error.
    let none = roundtrip(
        &tx,
        &mut rx,
        call(6, "search_documents", json!({"query": "RAG", "k": 0})),
    )
    .await;
    assert_eq!(none["result"]["results"], json!([]));

    let cleared = roundtrip(&tx, &mut rx, call(7, "clear_index", json!({"confirm": true}))).await;
    assert_eq!(cleared["result"]["cleared"], json!(true));
    assert_eq!(cleared["result"]["removed"], json!(2));
}
