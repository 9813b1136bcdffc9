//! Dialogue loop driven end to end by a scripted model

use haggle_core::llm::providers::scripted::ScriptStep;
use haggle_core::llm::ScriptedClient;
use haggle_core::negotiation::{DialogueLoop, Negotiator, Outcome, Scenario, Speaker};
use haggle_core::output::{NegotiationEvent, RecordingOutput};
use haggle_core::NegotiationSettings;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    dialogue: DialogueLoop,
    client: Arc<ScriptedClient>,
    output: Arc<RecordingOutput>,
}

fn harness(scenario: Scenario, steps: Vec<ScriptStep>, settings: NegotiationSettings) -> Harness {
    let client = Arc::new(ScriptedClient::new(steps));
    let output = Arc::new(RecordingOutput::new());
    let negotiator = Negotiator::new(client.clone(), scenario)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    let dialogue = DialogueLoop::new(negotiator, output.clone(), settings);
    Harness {
        dialogue,
        client,
        output,
    }
}

fn replies(texts: &[&str]) -> Vec<ScriptStep> {
    texts
        .iter()
        .map(|text| ScriptStep::Reply(text.to_string()))
        .collect()
}

fn settings(max_rounds: u32) -> NegotiationSettings {
    NegotiationSettings {
        max_rounds,
        ..Default::default()
    }
}

#[tokio::test]
async fn exit_after_two_rounds_makes_two_calls() {
    let settings = settings(3);
    let h = harness(
        Scenario::seller(&settings),
        replies(&["DECISION: COUNTER 680", "DECISION: COUNTER 670"]),
        settings,
    );

    let mut input: &[u8] = b"100\n120\nexit\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Withdrawn);
    assert_eq!(state.rounds(), 2);
    assert_eq!(state.transcript().len(), 4);
    assert_eq!(h.client.calls(), 2);
    assert_eq!(state.outcome(), Some(&Outcome::Withdrawn));
}

#[tokio::test]
async fn exit_keyword_in_any_case_skips_the_model() {
    for line in ["EXIT", "Exit", "  exit  ", "QUIT"] {
        let settings = settings(10);
        let h = harness(Scenario::buyer(&settings), Vec::new(), settings);

        let text = format!("{}\n500\n", line);
        let mut input = text.as_bytes();
        let mut state = h.dialogue.new_session();
        let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

        assert_eq!(outcome, Outcome::Withdrawn, "input {:?}", line);
        assert_eq!(h.client.calls(), 0);
        assert!(state.transcript().is_empty());
    }
}

#[tokio::test]
async fn rounds_stop_at_the_configured_maximum() {
    let settings = settings(2);
    let h = harness(
        Scenario::buyer(&settings),
        replies(&["DECISION: COUNTER 400", "DECISION: COUNTER 410"]),
        settings,
    );

    let mut input: &[u8] = b"600\n590\n580\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Expired);
    assert_eq!(state.rounds(), 2);
    assert_eq!(state.transcript().len(), 4);
    assert_eq!(h.client.calls(), 2);

    let events = h.output.events().await;
    let summary = events.iter().find_map(|event| match event {
        NegotiationEvent::SessionEnded { summary, .. } => summary.clone(),
        _ => None,
    });
    let summary = summary.expect("expired sessions carry a summary");
    assert_eq!(summary.final_price, 410);
    assert_eq!(summary.rounds, 2);
}

#[tokio::test]
async fn transcript_alternates_human_and_agent() {
    let settings = settings(5);
    let h = harness(
        Scenario::buyer(&settings),
        replies(&[
            "Too steep for me.\nDECISION: COUNTER 380",
            "Meet me halfway.\nDECISION: COUNTER 400",
        ]),
        settings,
    );

    let mut input: &[u8] = b"I want 600\nOkay, 560\nquit\n";
    let mut state = h.dialogue.new_session();
    h.dialogue.run(&mut input, &mut state).await.unwrap();

    let turns = state.transcript().turns();
    assert_eq!(turns.len(), 2 * state.rounds() as usize);
    for (i, turn) in turns.iter().enumerate() {
        let expected = if i % 2 == 0 {
            Speaker::Human
        } else {
            Speaker::Agent
        };
        assert_eq!(turn.speaker, expected);
    }
    assert_eq!(turns[0].offer, Some(600));
    assert_eq!(turns[3].text, "Meet me halfway.");
}

#[tokio::test]
async fn acceptance_ends_with_a_deal() {
    let settings = settings(10);
    let h = harness(
        Scenario::buyer(&settings),
        replies(&["Fine.\nDECISION: COUNTER 420"]),
        settings,
    );

    let mut input: &[u8] = b"440 is my last price\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::DealReached { price: 440 });
    assert_eq!(state.rounds(), 1);

    let events = h.output.events().await;
    assert!(events.iter().any(|event| matches!(
        event,
        NegotiationEvent::AgentTurn { accepted: true, price: 440, .. }
    )));
}

#[tokio::test]
async fn huge_buyer_offer_is_summarised_without_overflow() {
    let settings = settings(10);
    let h = harness(
        Scenario::seller(&settings),
        replies(&["DECISION: COUNTER 680"]),
        settings,
    );

    let mut input: &[u8] = b"I'll pay 100000000000000000\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    let price = 100_000_000_000_000_000;
    assert_eq!(outcome, Outcome::DealReached { price });

    let events = h.output.events().await;
    let summary = events
        .iter()
        .find_map(|event| match event {
            NegotiationEvent::SessionEnded { summary, .. } => summary.clone(),
            _ => None,
        })
        .expect("a deal carries a summary");
    assert_eq!(summary.final_price, price);
    assert_eq!(summary.difference, price as i64 - 460);
    assert_eq!(summary.difference_pct, 21_739_130_434_782_508);
    assert_eq!(summary.versus_market, price as i64 - 600);
    assert!(summary.to_string().contains("Margin over minimum: +₹99999999999999540"));
}

#[tokio::test]
async fn closing_ask_on_a_huge_offer_saturates() {
    let settings = NegotiationSettings {
        max_rounds: 2,
        closing_tactics: true,
        ..Default::default()
    };
    let scenario = Scenario::seller(&settings);
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let output = Arc::new(RecordingOutput::new());
    let negotiator = Negotiator::new(client.clone(), scenario)
        .unwrap()
        .with_closing_tactics(true);
    let dialogue = DialogueLoop::new(negotiator, output.clone(), settings);

    let mut input: &[u8] = b"18000000000000000000\n";
    let mut state = dialogue.new_session();
    let outcome = dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Withdrawn);
    assert_eq!(client.calls(), 0);
    let events = output.events().await;
    assert!(events.iter().any(|event| matches!(
        event,
        NegotiationEvent::AgentTurn { round: 1, price: u64::MAX, .. }
    )));
}

#[tokio::test]
async fn seller_opens_before_the_first_prompt() {
    let settings = settings(10);
    let h = harness(Scenario::seller(&settings), Vec::new(), settings);

    let mut input: &[u8] = b"exit\n";
    let mut state = h.dialogue.new_session();
    h.dialogue.run(&mut input, &mut state).await.unwrap();

    let events = h.output.events().await;
    assert!(matches!(events[0], NegotiationEvent::SessionStarted { .. }));
    match &events[1] {
        NegotiationEvent::AgentTurn {
            round,
            display_price,
            ..
        } => {
            assert_eq!(*round, 0);
            assert_eq!(display_price, "₹690");
        }
        other => panic!("expected the opening offer, got {:?}", other),
    }
    assert!(matches!(events[2], NegotiationEvent::AwaitingInput { .. }));
    assert_eq!(state.opening().and_then(|turn| turn.offer), Some(690));
    assert!(state.transcript().is_empty());
}

#[tokio::test]
async fn blank_lines_are_reprompted_and_eof_withdraws() {
    let settings = settings(10);
    let h = harness(Scenario::buyer(&settings), Vec::new(), settings);

    let mut input: &[u8] = b"\n   \n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Withdrawn);
    let prompts = h
        .output
        .events()
        .await
        .iter()
        .filter(|event| matches!(event, NegotiationEvent::AwaitingInput { .. }))
        .count();
    assert_eq!(prompts, 3);
}

#[tokio::test]
async fn failed_call_is_retried_once() {
    let settings = settings(10);
    let h = harness(
        Scenario::buyer(&settings),
        vec![
            ScriptStep::Fail("connection refused".to_string()),
            ScriptStep::Reply("DECISION: COUNTER 400".to_string()),
        ],
        settings,
    );

    let mut input: &[u8] = b"600\nexit\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Withdrawn);
    assert_eq!(state.rounds(), 1);
    assert_eq!(h.client.calls(), 2);

    let events = h.output.events().await;
    assert!(events.iter().any(|event| matches!(
        event,
        NegotiationEvent::RecoverableError { attempt: 1, max_attempts: 2, .. }
    )));
}

#[tokio::test]
async fn repeated_failures_abort_the_session() {
    let settings = settings(10);
    let h = harness(
        Scenario::buyer(&settings),
        vec![
            ScriptStep::Reply("I need to think about it.".to_string()),
            ScriptStep::Fail("connection refused".to_string()),
        ],
        settings,
    );

    let mut input: &[u8] = b"600\n500\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    match outcome {
        Outcome::Aborted { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected an abort, got {:?}", other),
    }
    assert_eq!(h.client.calls(), 2);
    assert_eq!(state.rounds(), 0);
    // the human line stays on record
    assert_eq!(state.transcript().len(), 1);

    let ended = h.output.events().await.into_iter().last();
    assert!(matches!(
        ended,
        Some(NegotiationEvent::SessionEnded { summary: None, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out() {
    let settings = NegotiationSettings {
        retries: 0,
        ..settings(10)
    };
    let h = harness(
        Scenario::buyer(&settings),
        vec![ScriptStep::Delayed(
            Duration::from_secs(120),
            "DECISION: COUNTER 400".to_string(),
        )],
        settings,
    );

    let mut input: &[u8] = b"600\n";
    let mut state = h.dialogue.new_session();
    let outcome = h.dialogue.run(&mut input, &mut state).await.unwrap();

    match outcome {
        Outcome::Aborted { reason } => assert!(reason.starts_with("Timeout error")),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn scripted_sessions_render_identically() {
    async fn run_once() -> Vec<serde_json::Value> {
        let settings = settings(3);
        let h = harness(
            Scenario::seller(&settings),
            replies(&[
                "These are the finest.\nDECISION: COUNTER 680",
                "Last chance.\nDECISION: COUNTER 660",
                "Fine.\nDECISION: COUNTER 650",
            ]),
            settings,
        );
        let mut input: &[u8] = b"400\n450\n500\n";
        let mut state = h.dialogue.new_session();
        h.dialogue.run(&mut input, &mut state).await.unwrap();

        h.output
            .events()
            .await
            .into_iter()
            .filter(|event| !matches!(event, NegotiationEvent::SessionStarted { .. }))
            .map(|event| serde_json::to_value(event).unwrap())
            .collect()
    }

    let first = run_once().await;
    let second = run_once().await;
    assert!(!first.is_empty());
    assert_eq!(first, second);
}
