use std::fs;

use wyn_agent_model::{ErrorKind, ModelMessage};
use wyn_agent_test_model::{PresetEvent, PresetResponse, TestModelProvider};

use crate::AgentBuilder;
use crate::code::ScriptError;
use crate::conversation::Role;

#[tokio::test]
async fn test_simple_message() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_exchange(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hi, ".to_owned()),
        PresetEvent::MessageDelta("what can I do for you?".to_owned()),
    ]));

    let mut agent = AgentBuilder::with_model_provider(model_provider).build();
    let reply = agent.send("Hello").await.unwrap();
    assert_eq!(reply, "Hi, what can I do for you?");

    let history = agent.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role(), Role::User);
    assert_eq!(history[0].content(), "Hello");
    assert_eq!(history[1].role(), Role::Assistant);
    assert_eq!(history[1].content(), reply);
}

#[tokio::test]
async fn test_history_alternates_and_is_sent_whole() {
    let mut model_provider = TestModelProvider::default();
    for i in 0..4 {
        model_provider.add_exchange(PresetResponse::with_text(format!("reply {i}")));
    }

    let mut agent =
        AgentBuilder::with_model_provider(model_provider.clone()).build();
    for i in 0..4 {
        agent.send(format!("message {i}")).await.unwrap();
        assert_eq!(agent.history().len(), 2 * (i + 1));
    }

    for (idx, msg) in agent.history().iter().enumerate() {
        let expected_role = if idx % 2 == 0 {
            Role::User
        } else {
            Role::Assistant
        };
        assert_eq!(msg.role(), expected_role);
    }

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 4);
    let last = &requests[3].messages;
    assert_eq!(last.len(), 7);
    assert_eq!(last[0], ModelMessage::User("message 0".to_owned()));
    assert_eq!(last[5], ModelMessage::Assistant("reply 2".to_owned()));
    assert_eq!(last[6], ModelMessage::User("message 3".to_owned()));
}

#[tokio::test]
async fn test_failed_send_keeps_history() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_exchange(PresetResponse::with_text("first"));
    model_provider
        .add_exchange(PresetResponse::with_failure(ErrorKind::Unauthorized));

    let mut agent = AgentBuilder::with_model_provider(model_provider).build();
    agent.send("one").await.unwrap();

    let err = agent.send("two").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(agent.history().len(), 2);
    assert_eq!(agent.history()[1].content(), "first");
}

#[tokio::test]
async fn test_extract_and_run_reply() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_exchange(PresetResponse::with_events([
        PresetEvent::MessageDelta("Try this:\n```sh\n".to_owned()),
        PresetEvent::MessageDelta("echo $((1+1))\n```\nDone.".to_owned()),
    ]));

    let mut agent = AgentBuilder::with_model_provider(model_provider)
        .with_code_fence(crate::code::CodeFence::new("sh", "sh"))
        .with_interpreter("sh")
        .build();
    let reply = agent.send("add one and one").await.unwrap();
    assert!(agent.code_fence().appears_in(&reply));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("add.sh");
    let saved = agent.extract_code_block(&reply, &path).unwrap().unwrap();
    assert_eq!(fs::read_to_string(&saved).unwrap(), "echo $((1+1))");

    let output = agent.run_script(&saved).await.unwrap();
    assert_eq!(output.stdout, "2\n");

    fs::write(&path, "exit 1").unwrap();
    let err = agent.run_script(&path).await.unwrap_err();
    assert!(matches!(err, ScriptError::ExitStatus { code: Some(1), .. }));
}

#[tokio::test]
async fn test_extract_miss() {
    let agent =
        AgentBuilder::with_model_provider(TestModelProvider::default()).build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.py");
    let saved = agent
        .extract_code_block("```js\nconsole.log(1)\n```", &path)
        .unwrap();
    assert_eq!(saved, None);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_python_block_scenario() {
    // Skip on hosts without a Python interpreter.
    if std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_err()
    {
        return;
    }

    let mut model_provider = TestModelProvider::default();
    model_provider.add_exchange(PresetResponse::with_text(
        "Of course. ```python\nprint(1+1)\n``` prints the sum.",
    ));
    let mut agent = AgentBuilder::with_model_provider(model_provider).build();
    let reply = agent.send("add one and one").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sum.py");
    let saved = agent.extract_code_block(&reply, &path).unwrap().unwrap();
    assert_eq!(fs::read_to_string(&saved).unwrap(), "print(1+1)");
    assert_eq!(agent.run_script(&saved).await.unwrap().stdout, "2\n");
}
