//! Owner capability check

use crate::traits::AccessControl;
use crate::types::*;

/// Default policy: only the configured owner may change the rate
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl AccessControl for OwnerOnly {
    fn authorize_rate_change(
        &self,
        config: &LedgerConfig,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if *caller == config.owner {
            Ok(())
        } else {
            Err(LedgerError::NotOwner { caller: *caller })
        }
    }
}
