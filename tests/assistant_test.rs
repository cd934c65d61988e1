//! Assistant behaviour through the public API: reply selection and the
//! chat session follow-up.

use assetsafe::assistant::{
    ChatEvent, HubConfig, KnowledgeBase, PanelAction, Responder, ReplySource, SearchHit,
    SearchIndex, Sender, SessionHub, SiteSearch, SitePage, Topic, FOLLOW_UP_MESSAGE,
};
use std::sync::Arc;
use std::time::Duration;

/// Search collaborator that never finds anything
struct NoResults;

impl SearchIndex for NoResults {
    fn search(&self, _query: &str, _limit: usize) -> Vec<SearchHit> {
        Vec::new()
    }
}

fn builtin_responder() -> Responder {
    Responder::new(
        Arc::new(KnowledgeBase::builtin()),
        Arc::new(SiteSearch::builtin()),
    )
}

fn plans_only() -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::new(vec![Topic::new(
            "plans",
            &["plan", "pricing"],
            "We have three plans.",
        )])
        .unwrap(),
    )
}

#[test]
fn test_replies_are_deterministic() {
    let responder = builtin_responder();
    let inputs = [
        ("Which plan is right for me?", "/"),
        ("How do I file an insurance claim?", "/"),
        ("something nobody has ever asked", "/pricing"),
        ("", "/account/settings"),
        ("   ", "/"),
    ];

    for (input, path) in inputs {
        let first = responder.generate_response(input, path);
        for _ in 0..5 {
            assert_eq!(responder.generate_response(input, path), first);
        }
    }
}

#[test]
fn test_first_declared_topic_wins() {
    let responder = builtin_responder();

    let reply = responder.select("plan pricing insurance claim", "/");
    assert_eq!(reply.source, ReplySource::Topic("plans".to_string()));

    // Matching is case-insensitive
    let upper = responder.select("PLAN PRICING INSURANCE CLAIM", "/");
    assert_eq!(upper.text, reply.text);
}

#[test]
fn test_plan_question_lists_prices() {
    let reply = builtin_responder().generate_response("Which plan is right for me?", "/");
    assert!(reply.contains("Standard (Homeowner) - $12.99/month"));
}

#[test]
fn test_fallback_chain_without_search_hits() {
    let responder = Responder::new(plans_only(), Arc::new(NoResults));

    assert_eq!(
        responder.select("hello there", "/pricing").source,
        ReplySource::PathFallback("/pricing")
    );
    assert_eq!(
        responder.select("hello there", "/account/settings").source,
        ReplySource::PathFallback("/account")
    );
    assert_eq!(responder.select("hello there", "/").source, ReplySource::Menu);
    assert_eq!(responder.select("", "/").source, ReplySource::Menu);
}

#[test]
fn test_search_answers_before_path_fallback() {
    let search = SiteSearch::new(vec![SitePage::new(
        "Moving checklist",
        "/resources/moving",
        "Pack and document belongings before a move",
        &["moving", "relocation"],
    )]);
    let responder = Responder::new(plans_only(), Arc::new(search));

    let reply = responder.select("tips for moving house", "/pricing");
    assert_eq!(reply.source, ReplySource::Search(1));
    assert!(reply.text.contains("[Moving checklist](/resources/moving)"));
}

#[test]
fn test_topic_beats_search() {
    let search = SiteSearch::new(vec![SitePage::new(
        "Plan comparison",
        "/pricing",
        "Compare every plan",
        &["plan"],
    )]);
    let responder = Responder::new(plans_only(), Arc::new(search));

    assert_eq!(
        responder.select("which plan", "/").source,
        ReplySource::Topic("plans".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_chat_follow_up_fires_once() {
    let hub = SessionHub::new(
        builtin_responder(),
        HubConfig {
            follow_up_delay: Duration::from_secs(180),
            ..HubConfig::default()
        },
    );

    let id = hub.create().await.unwrap();
    hub.apply(&id, PanelAction::Open).await.unwrap();

    let (user, reply) = hub
        .send(&id, "Which plan is right for me?", "/")
        .await
        .unwrap();
    assert_eq!(user.sender, Sender::User);
    assert!(reply.text.contains("Standard (Homeowner) - $12.99/month"));

    let mut events = hub.subscribe();
    let started = tokio::time::Instant::now();

    // Paused time auto-advances to the follow-up deadline
    let event = tokio::time::timeout(Duration::from_secs(181), events.recv())
        .await
        .expect("follow-up within three minutes")
        .unwrap();
    assert!(started.elapsed() >= Duration::from_secs(180));

    match event {
        ChatEvent::Message {
            session_id,
            message,
        } => {
            assert_eq!(session_id, id);
            assert_eq!(message.text, FOLLOW_UP_MESSAGE);
            assert_eq!(message.sender, Sender::Bot);
        }
        other => panic!("Expected follow-up message, got {:?}", other),
    }

    // No second follow-up, however long the session stays idle
    assert!(tokio::time::timeout(Duration::from_secs(3600), events.recv())
        .await
        .is_err());

    // Nor after further conversation
    hub.send(&id, "How do I file an insurance claim?", "/")
        .await
        .unwrap();
    let mut events = hub.subscribe();
    assert!(tokio::time::timeout(Duration::from_secs(3600), events.recv())
        .await
        .is_err());

    let snapshot = hub.snapshot(&id).await.unwrap();
    let follow_ups = snapshot
        .messages
        .iter()
        .filter(|m| m.text == FOLLOW_UP_MESSAGE)
        .count();
    assert_eq!(follow_ups, 1);
    assert!(snapshot.follow_up_sent);
}

#[tokio::test(start_paused = true)]
async fn test_no_follow_up_while_minimized() {
    let hub = SessionHub::new(builtin_responder(), HubConfig::default());

    let id = hub.create().await.unwrap();
    hub.apply(&id, PanelAction::Open).await.unwrap();
    hub.send(&id, "hello", "/").await.unwrap();
    hub.apply(&id, PanelAction::Minimize).await.unwrap();

    let mut events = hub.subscribe();
    assert!(tokio::time::timeout(Duration::from_secs(600), events.recv())
        .await
        .is_err());
    assert!(!hub.snapshot(&id).await.unwrap().follow_up_sent);
}
