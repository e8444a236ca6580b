use super::*;
use crate::application::store::RecordStore;
use crate::application::tooling::{LinkEvent, RecordHost, RecordLink, ToolRouter, channel_pair};
use crate::domain::record::PatientRecord;
use crate::infrastructure::model::{CompletionRequest, ModelError, ModelProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Mutex, Notify, oneshot};

#[derive(Clone)]
struct ScriptedProvider {
    responses: Arc<Mutex<Vec<String>>>,
    recordings: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(String::from).collect(),
            )),
            recordings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn requests(&self) -> Vec<CompletionRequest> {
        self.recordings.lock().await.clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        self.recordings.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        assert!(!responses.is_empty(), "scripted provider exhausted");
        Ok(responses.remove(0))
    }
}

/// Provider that parks inside `complete` until released, to hold a turn
/// in flight.
struct GatedProvider {
    entered: Mutex<Option<oneshot::Sender<()>>>,
    release: Arc<Notify>,
}

#[async_trait]
impl ModelProvider for GatedProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        if let Some(entered) = self.entered.lock().await.take() {
            let _ = entered.send(());
        }
        self.release.notified().await;
        Ok("done waiting".to_string())
    }
}

/// Full wiring: record host on one port, link on the other. Waits for
/// the startup catalog push so the system prompt sees the tools.
async fn wired_agent(
    provider: Arc<dyn ModelProvider>,
) -> (Arc<ChatAgent>, UnboundedReceiver<LinkEvent>) {
    let router = Arc::new(ToolRouter::new(RecordStore::new(PatientRecord::demo())));
    let (agent_port, host_port) = channel_pair();
    let _host = RecordHost::spawn(router, host_port);
    let (link, mut events) = RecordLink::spawn(agent_port, Duration::from_millis(500));

    loop {
        match events.recv().await.expect("startup event") {
            LinkEvent::CatalogReplaced(_) => break,
            LinkEvent::ContextReplaced => continue,
        }
    }

    (Arc::new(ChatAgent::new(provider, link)), events)
}

#[tokio::test]
async fn plain_reply_produces_no_steps() {
    let provider = ScriptedProvider::new(vec!["Hello! How can I help with this patient?"]);
    let (agent, _events) = wired_agent(Arc::new(provider.clone())).await;

    let outcome = agent.send("hi").await.expect("turn succeeds");

    assert_eq!(outcome.replies, vec!["Hello! How can I help with this patient?"]);
    assert!(outcome.steps.is_empty());

    let requests = provider.requests().await;
    assert_eq!(requests.len(), 1);
    let system = &requests[0].messages[0];
    assert!(system.content.contains("AVAILABLE TOOLS"));
    assert!(system.content.contains("addMedication"));
}

#[tokio::test]
async fn tool_turn_dispatches_formats_and_follows_up() {
    let provider = ScriptedProvider::new(vec![
        "Let me check the patient's information.\n\nTOOL_CALL: getContext\nPARAMS: {}",
        "Everything looks stable today.",
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider.clone())).await;

    let outcome = agent.send("how is the patient doing?").await.expect("turn succeeds");

    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].tool, "getContext");
    assert!(outcome.steps[0].success);

    assert_eq!(outcome.replies.len(), 3);
    assert_eq!(outcome.replies[0], "Let me check the patient's information.");
    assert!(outcome.replies[1].contains("2 medication(s)"));
    assert_eq!(outcome.replies[2], "Everything looks stable today.");

    // The follow-up completion carried the tool result back.
    let requests = provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(
        requests[1]
            .messages
            .iter()
            .any(|message| message.content.contains("tool_result"))
    );
}

#[tokio::test]
async fn failed_tool_yields_an_apology_not_an_error() {
    let provider = ScriptedProvider::new(vec![
        "I'll add that antibiotic.\n\nTOOL_CALL: addMedication\nPARAMS: {\"name\": \"Amoxicillin\", \"dose\": \"500mg\", \"frequency\": \"twice daily\"}",
        "We should pick a non-penicillin antibiotic instead.",
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider)).await;

    let outcome = agent
        .send("start amoxicillin 500mg twice daily")
        .await
        .expect("turn completes despite tool failure");

    assert_eq!(outcome.steps.len(), 1);
    assert!(!outcome.steps[0].success);
    let apology = &outcome.replies[1];
    assert!(apology.contains("I'm sorry"));
    assert!(apology.contains("addMedication"));
    assert!(apology.contains("allergic to Penicillin"));
}

#[tokio::test]
async fn record_mutations_persist_across_turns() {
    let provider = ScriptedProvider::new(vec![
        "TOOL_CALL: discontinueMedication\nPARAMS: \"Metformin\"",
        "Done.",
        "TOOL_CALL: discontinueMedication\nPARAMS: \"Metformin\"",
        "It was already stopped.",
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider)).await;

    let first = agent.send("stop metformin").await.expect("first turn");
    assert!(first.steps[0].success);
    assert!(first.replies.iter().any(|reply| reply.contains("Removed Metformin")));

    let second = agent.send("stop metformin").await.expect("second turn");
    assert!(!second.steps[0].success);
    assert!(
        second
            .replies
            .iter()
            .any(|reply| reply.contains("not found"))
    );
}

#[tokio::test]
async fn hop_cap_ends_the_turn_with_a_fallback_line() {
    let loop_response = "TOOL_CALL: getContext\nPARAMS: {}";
    let provider = ScriptedProvider::new(vec![
        loop_response,
        loop_response,
        loop_response,
        loop_response,
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider.clone())).await;

    let outcome = agent.send("keep checking").await.expect("turn succeeds");

    assert_eq!(outcome.steps.len(), 3);
    assert!(
        outcome
            .replies
            .last()
            .expect("fallback reply present")
            .contains("limit of automatic tool steps")
    );
    // Initial completion plus one follow-up per dispatched hop.
    assert_eq!(provider.requests().await.len(), 4);
}

#[tokio::test]
async fn second_turn_while_suspended_is_rejected_as_busy() {
    let (entered_tx, entered_rx) = oneshot::channel();
    let release = Arc::new(Notify::new());
    let provider = Arc::new(GatedProvider {
        entered: Mutex::new(Some(entered_tx)),
        release: Arc::clone(&release),
    });
    let (agent, _events) = wired_agent(provider).await;

    let in_flight = tokio::spawn({
        let agent = Arc::clone(&agent);
        async move { agent.send("first").await }
    });
    entered_rx.await.expect("first turn reached the provider");

    let err = agent.send("second").await.expect_err("guard rejects");
    assert!(matches!(err, AgentError::Busy));

    release.notify_one();
    let outcome = in_flight
        .await
        .expect("task joins")
        .expect("first turn succeeds");
    assert_eq!(outcome.replies, vec!["done waiting"]);
}

#[tokio::test]
async fn get_context_refreshes_the_cached_snapshot() {
    let provider = ScriptedProvider::new(vec![
        "TOOL_CALL: addAllergy\nPARAMS: {\"allergen\": \"Latex\"}",
        "Noted.\n\nTOOL_CALL: getContext\nPARAMS: {}",
        "The latex allergy is on file now.",
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider)).await;

    let outcome = agent
        .send("note a latex allergy then double-check the chart")
        .await
        .expect("turn succeeds");

    assert_eq!(outcome.steps.len(), 2);
    let context = outcome.steps[1].output.as_ref().expect("context data");
    let allergens: Vec<&str> = context["allergies"]
        .as_array()
        .expect("allergies array")
        .iter()
        .filter_map(|allergy| allergy["allergen"].as_str())
        .collect();
    assert!(allergens.contains(&"Latex"));
    assert!(allergens.contains(&"Penicillin"));
}

#[tokio::test]
async fn simulation_provider_drives_a_whole_turn() {
    use crate::infrastructure::model::SimulationClient;

    let (agent, _events) = wired_agent(Arc::new(SimulationClient)).await;
    let outcome = agent
        .send("prescribe azithromycin for the bronchitis")
        .await
        .expect("turn succeeds");

    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].tool, "addMedication");
    assert!(outcome.steps[0].success);
    let added = outcome.steps[0].output.as_ref().expect("medication data");
    assert_eq!(added["name"], "Azithromycin");
    // Simulator answers the tool result without another call.
    assert!(outcome.replies.iter().any(|reply| reply.contains("chart")));
}

#[tokio::test]
async fn bare_string_params_reach_the_router_intact() {
    let provider = ScriptedProvider::new(vec![
        "TOOL_CALL: discontinueMedication\nPARAMS: \"Lisinopril\"",
        "Stopped it.",
    ]);
    let (agent, _events) = wired_agent(Arc::new(provider)).await;

    let outcome = agent.send("drop the lisinopril").await.expect("turn succeeds");
    assert_eq!(outcome.steps[0].input, Value::String("Lisinopril".into()));
    assert!(outcome.steps[0].success);
}
