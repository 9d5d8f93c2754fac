use futures::StreamExt;
use switchyard_core::{StreamEvent, ToolCallingLlm};
use switchyard_llm::{LlmRequest, LlmResponse, Message, ScriptedLlm};

fn request(text: &str) -> LlmRequest {
    LlmRequest {
        model: "scripted".to_string(),
        messages: vec![Message::user(text)],
        tools: vec![],
    }
}

#[tokio::test]
async fn replays_queued_responses_in_order() {
    let llm = ScriptedLlm::from_texts(["first", "second"]);

    assert_eq!(llm.invoke(request("a")).await.unwrap().content, "first");
    assert_eq!(llm.invoke(request("b")).await.unwrap().content, "second");
    assert_eq!(llm.requests().len(), 2);
    assert_eq!(llm.requests()[1].messages[0].content, "b");
}

#[tokio::test]
async fn echoes_last_user_message_when_drained() {
    let llm = ScriptedLlm::echo();
    let response = llm.invoke(request("ping")).await.unwrap();
    assert_eq!(response.content, "echo: ping");

    llm.push(LlmResponse::text("queued"));
    assert_eq!(llm.invoke(request("x")).await.unwrap().content, "queued");
}

#[tokio::test]
async fn stream_response_emits_words_then_final_answer() {
    let llm = ScriptedLlm::from_texts(["one two three"]);
    let events: Vec<StreamEvent> = llm
        .stream_response(request("count"))
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], StreamEvent::ContentChunk("one ".to_string()));
    assert_eq!(
        events.last(),
        Some(&StreamEvent::FinalAnswer("one two three".to_string()))
    );
}
