//! Behavioural tests for correlation and event dispatch using `rstest-bdd`.

use std::cell::RefCell;
use std::thread;
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::errors::{ClientError, TransportError};
use crate::events::EventPoll;
use crate::message::Message;
use crate::tests::support::{
    EngineWorld, PATIENCE, QUIET_PERIOD, collect_events, eventually, fast_options,
};

#[fixture]
fn world() -> RefCell<EngineWorld> {
    RefCell::new(EngineWorld::new())
}

fn answer_for(request: &Message) -> Message {
    Message::new("reply").with("answers", request.type_name().unwrap_or_default())
}

#[given("a running client")]
fn given_running_client(world: &RefCell<EngineWorld>) {
    world.borrow_mut().start(fast_options());
}

#[given("a client with an event capacity of {capacity}")]
fn given_client_with_capacity(world: &RefCell<EngineWorld>, capacity: usize) {
    world
        .borrow_mut()
        .start(fast_options().with_event_capacity(capacity));
}

#[when("\"{first}\" and \"{second}\" requests are answered in reverse order")]
fn when_answered_in_reverse(world: &RefCell<EngineWorld>, first: String, second: String) {
    let mut world = world.borrow_mut();
    let transport = world.transport.clone();
    let client = world.client();

    let (first_outcome, second_outcome) = thread::scope(|scope| {
        let first_call =
            scope.spawn(|| client.send_and_await(Message::new(first.as_str()), PATIENCE));
        let first_request = transport.next_sent(PATIENCE).expect("first request sent");
        let second_call =
            scope.spawn(|| client.send_and_await(Message::new(second.as_str()), PATIENCE));
        let second_request = transport.next_sent(PATIENCE).expect("second request sent");

        transport.reply_to(&second_request, answer_for(&second_request));
        transport.reply_to(&first_request, answer_for(&first_request));

        (
            first_call.join().expect("first caller panicked"),
            second_call.join().expect("second caller panicked"),
        )
    });

    world.outcomes.insert(first, first_outcome);
    world.outcomes.insert(second, second_outcome);
}

#[when("a \"{kind}\" request waits {millis} milliseconds without a reply")]
fn when_request_times_out(world: &RefCell<EngineWorld>, kind: String, millis: u64) {
    let mut world = world.borrow_mut();
    let started = Instant::now();
    let outcome = world
        .client()
        .send_and_await(Message::new(kind.as_str()), Duration::from_millis(millis));
    world.elapsed = Some(started.elapsed());
    world.outcomes.insert(kind, outcome);
}

#[when("the late reply to the last request arrives")]
fn when_late_reply_arrives(world: &RefCell<EngineWorld>) {
    let world = world.borrow();
    let request = world
        .transport
        .sent()
        .last()
        .cloned()
        .expect("a request was sent");
    world.transport.reply_to(&request, answer_for(&request));
    assert!(eventually(|| world.transport.queued() == 0));
}

#[when("the transport emits updates \"{first}\", \"{second}\" and \"{third}\"")]
fn when_updates_emitted(world: &RefCell<EngineWorld>, first: String, second: String, third: String) {
    let world = world.borrow();
    for kind in [first, second, third] {
        world.transport.push(&Message::new(kind));
    }
}

#[when("the transport emits a \"{kind}\" reply tagged \"{tag}\"")]
fn when_unknown_reply_emitted(world: &RefCell<EngineWorld>, kind: String, tag: String) {
    let world = world.borrow();
    let mut reply = Message::new(kind);
    reply.set_extra(tag);
    world.transport.push(&reply);
    assert!(eventually(|| world.transport.queued() == 0));
}

#[when("a \"{kind}\" request is pending and the transport fails")]
fn when_transport_fails(world: &RefCell<EngineWorld>, kind: String) {
    let mut world = world.borrow_mut();
    let transport = world.transport.clone();
    let client = world.client();

    let outcome = thread::scope(|scope| {
        let call = scope.spawn(|| client.send_and_await(Message::new(kind.as_str()), PATIENCE));
        transport.next_sent(PATIENCE).expect("request sent");
        transport.fail_receive(TransportError::Closed);
        call.join().expect("caller panicked")
    });

    world.outcomes.insert(kind, outcome);
}

#[then("the \"{kind}\" caller receives its own reply")]
fn then_caller_receives_own_reply(world: &RefCell<EngineWorld>, kind: String) {
    let world = world.borrow();
    let reply = world.outcome(&kind).as_ref().expect("reply delivered");

    assert_eq!(reply.type_name(), Some("reply"));
    assert_eq!(
        reply.get("answers").and_then(|value| value.as_str()),
        Some(kind.as_str())
    );
}

#[then("the \"{kind}\" request times out after at least {millis} milliseconds")]
fn then_request_times_out(world: &RefCell<EngineWorld>, kind: String, millis: u64) {
    let world = world.borrow();
    let error = world.outcome(&kind).as_ref().expect_err("request should time out");

    assert!(error.is_timeout(), "unexpected error: {error}");
    let elapsed = world.elapsed.expect("elapsed time recorded");
    assert!(elapsed >= Duration::from_millis(millis), "returned after {elapsed:?}");
}

#[then("the \"{kind}\" request fails because dispatch stopped")]
fn then_request_fails_stopped(world: &RefCell<EngineWorld>, kind: String) {
    let world = world.borrow();

    assert!(matches!(
        world.outcome(&kind),
        Err(ClientError::DispatcherStopped)
    ));
}

#[then("no requests remain pending")]
fn then_nothing_pending(world: &RefCell<EngineWorld>) {
    assert_eq!(world.borrow().client().pending_requests(), 0);
}

#[then("the event stream stays empty")]
fn then_stream_empty(world: &RefCell<EngineWorld>) {
    let events = world.borrow().client().events();

    assert_eq!(events.recv_timeout(QUIET_PERIOD), EventPoll::Empty);
}

#[then("the event stream yields \"{first}\", \"{second}\" and \"{third}\" in order")]
fn then_stream_in_order(world: &RefCell<EngineWorld>, first: String, second: String, third: String) {
    let events = world.borrow().client().events();

    let received: Vec<String> = collect_events(&events, 3)
        .iter()
        .map(|event| event.type_name().unwrap_or_default().to_owned())
        .collect();

    assert_eq!(received, [first, second, third]);
}

#[then("the event stream holds {count} updates while dispatch waits")]
fn then_stream_holds(world: &RefCell<EngineWorld>, count: usize) {
    let world = world.borrow();
    let events = world.client().events();

    assert!(eventually(|| events.len() == count && world.transport.queued() == 0));
    thread::sleep(QUIET_PERIOD);
    assert_eq!(events.len(), count, "dispatch must not drop or overfill");
}

#[then("the client reports that dispatch has stopped")]
fn then_dispatch_stopped(world: &RefCell<EngineWorld>) {
    let world = world.borrow();
    let client = world.client();

    assert!(eventually(|| !client.is_running()));
    assert_eq!(client.events().recv_timeout(PATIENCE), EventPoll::Closed);
    assert!(matches!(
        client.send_and_await(Message::new("getMe"), PATIENCE),
        Err(ClientError::DispatcherStopped)
    ));
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "Replies answered out of order reach their own callers"
)]
fn replies_reach_their_callers(world: RefCell<EngineWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "A silent transport times the request out"
)]
fn silent_transport_times_out(world: RefCell<EngineWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "Untagged updates are streamed in arrival order"
)]
fn updates_stream_in_order(world: RefCell<EngineWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "Replies for unknown tags are dropped"
)]
fn unknown_tags_are_dropped(world: RefCell<EngineWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "A full event stream holds back later updates"
)]
fn full_stream_holds_back(world: RefCell<EngineWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/correlation.feature",
    name = "A receive failure wakes pending callers"
)]
fn receive_failure_wakes_callers(world: RefCell<EngineWorld>) {
    let _ = world;
}
