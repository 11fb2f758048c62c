//! Action state machine tests
//!
//! All tests run on a paused tokio clock, so timers fire deterministically as
//! soon as the runtime has nothing else to do.

use chainviz_flow::{
    is_reference_id, ActionConfig, ActionKind, ActionMachine, ActionParams, ActionState,
    ActionStatus, FlowError,
};
use rstest::rstest;
use std::time::Duration;
use tokio::time::sleep;

const DELAY: Duration = Duration::from_millis(200);
const INTERVAL: Duration = Duration::from_millis(100);

fn fast_config(required: u32) -> ActionConfig {
    ActionConfig::default()
        .with_processing_delay(DELAY)
        .with_confirmation_interval(INTERVAL)
        .with_required_confirmations(required)
}

fn deposit_machine(required: u32) -> ActionMachine {
    ActionMachine::new(ActionKind::Deposit, fast_config(required)).unwrap()
}

fn label(state: &ActionState) -> String {
    match state.status {
        ActionStatus::Confirming => format!("confirming({})", state.confirmations),
        status => status.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_three_confirmation_walkthrough() {
    let machine = deposit_machine(3);
    let mut updates = machine.subscribe();
    let mut observed = Vec::new();

    let pending = machine
        .submit(ActionParams::new().with_amount("1.5").with_source("ethereum"))
        .await;
    observed.push(label(&machine.snapshot()));

    let reference_id = pending.await.unwrap();
    observed.push(label(&machine.snapshot()));
    assert!(is_reference_id(&reference_id));

    machine.confirm(reference_id.clone()).await.unwrap();
    updates.borrow_and_update();

    while !machine.snapshot().status.is_terminal() {
        updates.changed().await.unwrap();
        observed.push(label(&updates.borrow_and_update()));
    }

    assert_eq!(
        observed,
        [
            "processing",
            "awaiting",
            "confirming(1)",
            "confirming(2)",
            "completed"
        ]
    );

    let finished = machine.snapshot();
    assert_eq!(finished.confirmations, 3);
    assert_eq!(finished.reference_id.as_deref(), Some(reference_id.as_str()));
    assert_eq!(finished.params.amount.as_deref(), Some("1.5"));
    assert_eq!(finished.progress(), 1.0);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(6)]
#[tokio::test(start_paused = true)]
async fn test_completes_on_exactly_the_nth_tick(#[case] required: u32) {
    let machine = deposit_machine(required);
    let mut updates = machine.subscribe();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id).await.unwrap();
    updates.borrow_and_update();

    for tick in 1..=required {
        updates.changed().await.unwrap();
        let state = updates.borrow_and_update().clone();
        assert_eq!(state.confirmations, tick);

        if tick < required {
            assert_eq!(state.status, ActionStatus::Confirming, "tick {tick}");
        } else {
            assert_eq!(state.status, ActionStatus::Completed, "tick {tick}");
        }
    }

    // Ticker stops once the threshold is reached.
    sleep(INTERVAL * 10).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(machine.snapshot().confirmations, required);
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_confirmation_discards_pending_ticks() {
    let machine = deposit_machine(5);
    let mut updates = machine.subscribe();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id).await.unwrap();
    updates.borrow_and_update();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().confirmations, 1);

    machine.reset().await;
    updates.borrow_and_update();

    let state = machine.snapshot();
    assert_eq!(state.status, ActionStatus::Idle);
    assert_eq!(state.confirmations, 0);
    assert_eq!(state.reference_id, None);
    assert!(state.params.is_empty());

    sleep(INTERVAL * 20).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(machine.snapshot().status, ActionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reset_while_processing_supersedes_start() {
    let machine = deposit_machine(3);

    let pending = machine.submit(ActionParams::new()).await;
    machine.reset().await;

    assert!(matches!(pending.await, Err(FlowError::Superseded)));

    sleep(DELAY * 5).await;
    let state = machine.snapshot();
    assert_eq!(state.status, ActionStatus::Idle);
    assert_eq!(state.reference_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_acts_as_reset_then_start() {
    let machine = deposit_machine(2);
    let mut updates = machine.subscribe();

    let first = machine
        .submit(ActionParams::new().with_amount("1"))
        .await;
    let second = machine
        .submit(ActionParams::new().with_amount("2"))
        .await;

    assert!(matches!(first.await, Err(FlowError::Superseded)));
    let reference_id = second.await.unwrap();

    let awaiting = machine.snapshot();
    assert_eq!(awaiting.status, ActionStatus::Awaiting);
    assert_eq!(awaiting.reference_id.as_deref(), Some(reference_id.as_str()));
    assert_eq!(awaiting.params.amount.as_deref(), Some("2"));

    machine.confirm(reference_id).await.unwrap();
    updates.borrow_and_update();

    let mut completions = 0;
    let mut ticks = 0;
    while !machine.snapshot().status.is_terminal() {
        updates.changed().await.unwrap();
        ticks += 1;
        if updates.borrow_and_update().status == ActionStatus::Completed {
            completions += 1;
        }
    }

    sleep(INTERVAL * 10).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(completions, 1);
    assert_eq!(ticks, 2);
}

#[tokio::test(start_paused = true)]
async fn test_forced_error_is_terminal_until_restart() {
    let machine = deposit_machine(4);
    let mut updates = machine.subscribe();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id.clone()).await.unwrap();
    updates.borrow_and_update();
    updates.changed().await.unwrap();

    machine.update_status(ActionStatus::Error).await.unwrap();
    sleep(INTERVAL * 10).await;

    let failed = machine.snapshot();
    assert_eq!(failed.status, ActionStatus::Error);
    assert_eq!(failed.confirmations, 1);

    let err = machine.confirm(reference_id).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidTransition {
            status: ActionStatus::Error,
            operation: "confirm",
            ..
        }
    ));

    // Retry affordance: starting again clears the failure.
    let retried = machine.start(ActionParams::new()).await.unwrap();
    let state = machine.snapshot();
    assert_eq!(state.status, ActionStatus::Awaiting);
    assert_eq!(state.confirmations, 0);
    assert_eq!(state.reference_id, Some(retried));
}

#[tokio::test(start_paused = true)]
async fn test_update_status_idle_behaves_as_reset() {
    let machine = deposit_machine(2);
    machine.start(ActionParams::new()).await.unwrap();

    machine.update_status(ActionStatus::Idle).await.unwrap();

    let state = machine.snapshot();
    assert!(state.is_idle());
    assert_eq!(state.reference_id, None);
}

#[rstest]
#[case(ActionStatus::Processing)]
#[case(ActionStatus::Awaiting)]
#[case(ActionStatus::Confirming)]
#[case(ActionStatus::Completed)]
#[tokio::test(start_paused = true)]
async fn test_update_status_rejects_timer_driven_statuses(#[case] forced: ActionStatus) {
    let machine = deposit_machine(6);
    let mut updates = machine.subscribe();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id).await.unwrap();
    updates.borrow_and_update();

    let err = machine.update_status(forced).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidTransition {
            status: ActionStatus::Confirming,
            operation: "update_status",
            ..
        }
    ));

    let state = machine.snapshot();
    assert_eq!(state.status, ActionStatus::Confirming);
    assert_eq!(state.confirmations, 0);
    assert!(!updates.has_changed().unwrap());

    // Ticker keeps running after the refusal.
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().confirmations, 1);
}

#[rstest]
#[case(ActionStatus::Processing)]
#[case(ActionStatus::Completed)]
#[tokio::test(start_paused = true)]
async fn test_update_status_from_idle_stays_idle(#[case] forced: ActionStatus) {
    let machine = deposit_machine(2);

    assert!(machine.update_status(forced).await.is_err());

    sleep(DELAY * 10).await;
    let state = machine.snapshot();
    assert!(state.is_idle());
    assert_eq!(state.reference_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_machine_stops_confirmations() {
    let machine = deposit_machine(5);
    let mut updates = machine.subscribe();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id).await.unwrap();
    updates.borrow_and_update();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().confirmations, 1);

    drop(machine);
    sleep(INTERVAL * 20).await;

    assert_eq!(updates.borrow().confirmations, 1);
    assert_eq!(updates.borrow().status, ActionStatus::Confirming);
    // Aborted tasks release the last sender.
    assert!(updates.has_changed().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_confirm_requires_awaiting() {
    let machine = deposit_machine(2);

    let err = machine.confirm("0xdead").await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidTransition {
            kind: ActionKind::Deposit,
            status: ActionStatus::Idle,
            ..
        }
    ));

    let pending = machine.submit(ActionParams::new()).await;
    assert!(machine.confirm("0xdead").await.is_err());
    assert!(pending.await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_action_without_confirmation_phase_completes_on_confirm() {
    let machine = ActionMachine::new(
        ActionKind::Swap,
        fast_config(6).without_confirmation_phase(),
    )
    .unwrap();

    let reference_id = machine.start(ActionParams::new()).await.unwrap();
    machine.confirm(reference_id).await.unwrap();

    let state = machine.snapshot();
    assert_eq!(state.status, ActionStatus::Completed);
    assert_eq!(state.progress(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_independent_machines_do_not_interfere() {
    let deposit = deposit_machine(2);
    let withdrawal = ActionMachine::new(ActionKind::Withdrawal, fast_config(2)).unwrap();
    let mut deposit_updates = deposit.subscribe();

    let deposit_id = deposit.start(ActionParams::new()).await.unwrap();
    let withdrawal_id = withdrawal.start(ActionParams::new()).await.unwrap();
    assert_ne!(deposit_id, withdrawal_id);

    deposit.confirm(deposit_id).await.unwrap();
    withdrawal.reset().await;
    deposit_updates.borrow_and_update();

    while !deposit.snapshot().status.is_terminal() {
        deposit_updates.changed().await.unwrap();
    }

    assert_eq!(deposit.snapshot().status, ActionStatus::Completed);
    assert_eq!(withdrawal.snapshot().status, ActionStatus::Idle);
}

#[test]
fn test_rejects_invalid_config() {
    let result = ActionMachine::new(ActionKind::Mint, fast_config(0));
    assert!(matches!(result, Err(FlowError::InvalidConfig(_))));
}
