//! Session store integration

mod common;

use std::sync::Arc;

use adept_core::{
    FileSessionStore, InMemorySessionStore, InterviewConfig, InterviewMachine, SessionConfig,
    SessionId, SessionStore, StateTag,
};

fn machine_with_store(store: Arc<dyn SessionStore>) -> InterviewMachine {
    InterviewMachine::builder(common::bank())
        .store(store)
        .config(InterviewConfig {
            require_generator: false,
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn completed_interview_is_persisted() {
    let store = Arc::new(InMemorySessionStore::new());
    let machine = machine_with_store(store.clone());
    let state = machine
        .start(SessionConfig::new().session_id("persisted").total_questions(2))
        .unwrap();

    let state = common::begin(&machine, state).await;
    let done = common::run_to_completion(&machine, state, "answer").await;
    let id = SessionId::from("persisted");

    assert_eq!(store.load_session(&id).await.unwrap(), done);
    assert_eq!(store.load_evaluations(&id).await.unwrap().len(), 2);
    assert_eq!(store.load_profile(&id).await.unwrap().total_questions, 2);

    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].state, StateTag::Completed);
}

#[tokio::test]
async fn file_store_survives_a_new_machine() {
    let dir = tempfile::tempdir().unwrap();
    let id = SessionId::from("on-disk");

    {
        let machine = machine_with_store(Arc::new(FileSessionStore::new(dir.path())));
        let state = machine
            .start(SessionConfig::new().session_id("on-disk").total_questions(1))
            .unwrap();
        let state = common::begin(&machine, state).await;
        common::run_to_completion(&machine, state, "answer").await;
    }

    let machine = machine_with_store(Arc::new(FileSessionStore::new(dir.path())));
    assert!(machine.profile_summary(&id).await.is_err());

    let summary = machine.load_profile(&id).await.unwrap();
    assert_eq!(summary.total_questions, 1);
    assert_eq!(machine.profile_summary(&id).await.unwrap(), summary);

    let store = machine.session_store().unwrap();
    let state = store.load_session(&id).await.unwrap();
    assert_eq!(state.current_state, StateTag::Completed);
    assert!(state.final_report.is_some());

    assert!(store.delete_session(&id).await.unwrap());
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn profile_can_be_saved_on_demand() {
    let store = Arc::new(InMemorySessionStore::new());
    let machine = machine_with_store(store.clone());
    let state = machine
        .start(SessionConfig::new().session_id("mid").total_questions(3))
        .unwrap();
    let state = common::begin(&machine, state).await;
    common::answer(&machine, &state, "answer").await;

    let id = SessionId::from("mid");
    store.delete_session(&id).await.unwrap();
    machine.save_profile(&id).await.unwrap();

    assert_eq!(store.load_profile(&id).await.unwrap().total_questions, 1);
}
