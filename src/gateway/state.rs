use std::sync::Arc;

use crate::account::AccountLedger;
use crate::auth::{KeyTrustCache, TokenVerifier};
use crate::transfer::TransferCoordinator;
use crate::user_auth::UserAuthService;

/// Payments process state (shared)
pub struct PaymentsState<S> {
    pub ledger: AccountLedger<S>,
    pub transfers: TransferCoordinator<S>,
    pub verifier: Arc<TokenVerifier>,
}

impl<S> PaymentsState<S> {
    pub fn new(
        ledger: AccountLedger<S>,
        transfers: TransferCoordinator<S>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        Self {
            ledger,
            transfers,
            verifier,
        }
    }

    pub fn keys(&self) -> &Arc<KeyTrustCache> {
        self.verifier.keys()
    }
}

/// Auth process state (shared by the public and internal routers)
pub struct AuthServiceState {
    pub users: UserAuthService,
}

impl AuthServiceState {
    pub fn new(users: UserAuthService) -> Self {
        Self { users }
    }
}
