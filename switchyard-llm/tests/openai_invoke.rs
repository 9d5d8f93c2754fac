use futures::StreamExt;
use httpmock::prelude::*;
use serde_json::json;
use switchyard_core::{Runnable, StreamEvent, SwitchyardError};
use switchyard_llm::{LlmRequest, Message, OpenAiCompatibleClient, ToolSpec};

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::builder()
        .base_url(&server.url("/v1"))
        .expect("base url")
        .api_key("test-key")
        .default_model("gpt-4o-mini")
        .build()
        .expect("client")
}

fn request(text: &str) -> LlmRequest {
    LlmRequest {
        model: String::new(),
        messages: vec![Message::system("be brief"), Message::user(text)],
        tools: vec![],
    }
}

#[tokio::test]
async fn invoke_maps_content_and_usage() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .json_body_partial(r#"{"model":"gpt-4o-mini","stream":false}"#);
        then.status(200).json_body(json!({
            "id": "chat-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }));
    });

    let client = client_for(&server);
    let response = client.invoke(request("hi")).await.expect("invoke");

    assert_eq!(response.content, "hello");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.usage.map(|usage| usage.total_tokens), Some(15));
    mock.assert();
}

#[tokio::test]
async fn invoke_decodes_tool_call_arguments() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "execute_command", "arguments": "{\"command\":\"ls\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }));
    });

    let mut req = request("list files");
    req.tools.push(ToolSpec {
        name: "execute_command".to_string(),
        description: "run a command".to_string(),
        parameters: json!({"type": "object"}),
    });

    let response = client_for(&server).invoke(req).await.expect("invoke");
    assert_eq!(response.content, "");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_1");
    assert_eq!(response.tool_calls[0].name, "execute_command");
    assert_eq!(response.tool_calls[0].args, json!({"command": "ls"}));
}

#[tokio::test]
async fn error_status_surfaces_provider_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401).json_body(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        }));
    });

    let err = client_for(&server)
        .invoke(request("hi"))
        .await
        .expect_err("should fail");
    match err {
        SwitchyardError::LlmProvider(message) => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("Incorrect API key"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn stream_yields_chunks_then_final_answer() {
    let server = MockServer::start();
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"stream":true}"#);
        then.status(200)
            .header("content-type", "text/event-stream")
            .body(body);
    });

    let client = client_for(&server);
    let events: Vec<StreamEvent> = client
        .stream(request("hi"))
        .map(|event| event.expect("event"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::ContentChunk("Hel".to_string()),
            StreamEvent::ContentChunk("lo".to_string()),
            StreamEvent::FinalAnswer("Hello".to_string()),
        ]
    );
}

/// Serves one chunked SSE response, writing each element of `parts` as its
/// own HTTP chunk with a pause in between.
async fn serve_chunked(parts: Vec<Vec<u8>>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\
                  transfer-encoding: chunked\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        for part in parts {
            let mut frame = format!("{:x}\r\n", part.len()).into_bytes();
            frame.extend_from_slice(&part);
            frame.extend_from_slice(b"\r\n");
            socket.write_all(&frame).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    });
    format!("http://{addr}/v1")
}

#[tokio::test]
async fn stream_keeps_multibyte_characters_split_across_chunks() {
    let line = "data: {\"choices\":[{\"delta\":{\"content\":\"h\u{e9}llo\"}}]}\n\ndata: [DONE]\n\n";
    let bytes = line.as_bytes();
    let split = bytes.iter().position(|byte| *byte == 0xC3).unwrap() + 1;
    let base_url = serve_chunked(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]).await;

    let client = OpenAiCompatibleClient::builder()
        .base_url(&base_url)
        .expect("base url")
        .api_key("test-key")
        .build()
        .expect("client");
    let events: Vec<StreamEvent> = client
        .stream(request("hi"))
        .map(|event| event.expect("event"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::ContentChunk("h\u{e9}llo".to_string()),
            StreamEvent::FinalAnswer("h\u{e9}llo".to_string()),
        ]
    );
}

#[test]
fn build_without_api_key_is_a_config_error() {
    let err = OpenAiCompatibleClient::builder()
        .build()
        .expect_err("missing key");
    assert!(matches!(err, SwitchyardError::InvalidConfig(_)));
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = OpenAiCompatibleClient::builder().base_url("not a url");
    assert!(matches!(result, Err(SwitchyardError::InvalidConfig(_))));
}
