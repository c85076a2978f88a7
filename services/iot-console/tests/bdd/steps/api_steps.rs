//! BDD step definitions for the response envelope feature

use cucumber::{given, then, when};

use iot_console::model::Project;
use iot_console::notice::NoticeLevel;
use iot_console::ConsoleError;

use crate::world::ConsoleWorld;

#[given(expr = "the backend answers {int} with body {string}")]
fn backend_answers(world: &mut ConsoleWorld, status: u16, body: String) {
    world.backend.queue(status, body);
}

#[when(expr = "the project {string} is fetched")]
async fn project_fetched(world: &mut ConsoleWorld, project_id: String) {
    match world.api().fetch_project(&project_id).await {
        Ok(project) => {
            world.project = Some(std::sync::Arc::new(project));
            world.last_error = None;
        }
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "the project {string} is deleted")]
async fn project_deleted(world: &mut ConsoleWorld, project_id: String) {
    world.last_error = world.api().delete_project(&project_id).await.err();
}

#[then(expr = "the call fails with message {string}")]
fn call_fails_with(world: &mut ConsoleWorld, message: String) {
    let error = world.last_error.as_ref().expect("call did not fail");
    assert!(matches!(error, ConsoleError::Api(_)), "{error:?}");
    assert_eq!(error.to_string(), message);
}

#[then(expr = "the call fails with an HTTP error mentioning {string}")]
fn call_fails_http(world: &mut ConsoleWorld, fragment: String) {
    match world.last_error.as_ref().expect("call did not fail") {
        ConsoleError::Http(msg) => assert!(msg.contains(&fragment), "{msg}"),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[then(expr = "the call succeeds")]
fn call_succeeds(world: &mut ConsoleWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}

#[then(expr = "the fetched project is named {string}")]
fn fetched_project_named(world: &mut ConsoleWorld, name: String) {
    let project: &Project = world.project();
    assert_eq!(project.project_name, name);
}

#[then(expr = "an error notice says {string}")]
fn error_notice_says(world: &mut ConsoleWorld, message: String) {
    let notice = world.notices.last().expect("no notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, message);
}

#[then(expr = "a success notice says {string}")]
fn success_notice_says(world: &mut ConsoleWorld, message: String) {
    let notice = world.notices.last().expect("no notice");
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, message);
}
