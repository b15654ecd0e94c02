use super::*;
use cvalign::store::token::StoreError;

// =============================================================================
// start-up
// =============================================================================

#[test]
fn unreadable_token_store_does_not_abort_start_up() {
    let outcome = Err(AuthError::Store(StoreError::Unavailable("permission denied".into())));
    assert!(tolerate_store_failure(outcome).is_ok());
}

#[test]
fn settled_start_up_passes_through() {
    assert!(tolerate_store_failure(Ok(AuthState::anonymous())).is_ok());
}

#[test]
fn other_start_up_failures_still_abort() {
    let err = tolerate_store_failure(Err(AuthError::Disposed)).unwrap_err();
    assert!(matches!(err, AuthError::Disposed));
}
