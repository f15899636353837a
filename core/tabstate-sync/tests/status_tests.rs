use pretty_assertions::assert_eq;
use tabstate_sync::{ErrorStatus, Failure, Operation, SyncError};

#[test]
fn operation_descriptions() {
    let cases = [
        (Operation::SetInitialState, "set of the initial state of the global state"),
        (Operation::LoadInitialState, "loading of the initial state of the global state"),
        (Operation::SetGlobalState, "set of the global state"),
        (Operation::ResetInitial, "reset to current initial state"),
        (Operation::OnlyCurrentInitial, "reset to only current initial state"),
        (Operation::DeleteState, "delete of the global state"),
        (Operation::RemoteUpdate, "update changes of the global state"),
    ];
    for (operation, description) in cases {
        assert_eq!(operation.description(), description);
        assert_eq!(operation.to_string(), description);
    }
}

#[test]
fn failure_message_names_operation_and_error() {
    let failure = Failure::new(
        Operation::SetGlobalState,
        &SyncError::Configuration("boom".into()),
    );
    assert_eq!(
        failure.message,
        "Error in the set of the global state: configuration error: boom"
    );
}

#[test]
fn status_starts_clean() {
    let status = ErrorStatus::new();
    assert!(!status.is_error());
    assert_eq!(status.error_message(), None);
    assert_eq!(status.last_failure(), None);
}

#[test]
fn latest_failure_wins_and_is_never_cleared() {
    let status = ErrorStatus::default();
    status.record(Operation::DeleteState, &SyncError::ChannelClosed);
    status.record(Operation::ResetInitial, &SyncError::NoRuntime);

    let failure = status.last_failure().unwrap();
    assert_eq!(failure.operation, Operation::ResetInitial);
    assert_eq!(
        status.error_message().as_deref(),
        Some("Error in the reset to current initial state: no tokio runtime available")
    );
    assert!(status.is_error());
}

#[test]
fn clones_share_the_status() {
    let status = ErrorStatus::new();
    let mut rx = status.subscribe();
    let clone = status.clone();

    clone.record(Operation::RemoteUpdate, &SyncError::ChannelClosed);

    assert!(status.is_error());
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        rx.borrow_and_update().as_ref().map(|f| f.operation),
        Some(Operation::RemoteUpdate)
    );
}
