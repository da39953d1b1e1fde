//! Multi-step status walks built from single resource calls
//!
//! Each step re-reads the record, so the walk stops wherever the server
//! leaves it and the final record is returned for inspection.

use reqwest::StatusCode;
use serde_json::Value;

use crate::client::AlliantClient;
use crate::error::AlliantError;
use crate::resource::{Action, ResourceKind};
use crate::response::{Adjustment, ApiMessage, Contract};

const ACTIVE: &str = "Active";
const APPROVED: &str = "Approved";
const COMPLETE: &str = "Complete";
const IN_REVISION: &str = "In Revision";
const IN_SETUP: &str = "In Setup";
const PRIOR_REVISION: &str = "Prior Revision";

/// Result of [`AlliantClient::delete_contract_with_revision`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    Deleted,
    /// The delete call was made and rejected
    Failed {
        status: StatusCode,
        errors: Vec<ApiMessage>,
    },
    /// The contract's status does not allow deletion
    Skipped { status: Option<String> },
}

fn label(result: &Value, key: &str, guid: &str) -> String {
    result
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(guid)
        .to_string()
}

impl AlliantClient {
    /// Take a contract through complete and approve
    ///
    /// `In Revision`/`In Setup` contracts are completed first; `Complete`
    /// contracts are approved with `approve_message`.
    pub fn complete_and_approve_contract(
        &self,
        guid: &str,
        approve_message: &str,
    ) -> Result<Contract, AlliantError> {
        let mut contract = self.lookup_contract(guid)?;
        if !contract.ok() {
            return Ok(contract);
        }
        let contract_id = label(contract.result(), "id", guid);
        let initial = contract
            .contract_status()
            .ok_or(AlliantError::UnexpectedResult("statusReference.displayName"))?;
        tracing::info!(contract = %contract_id, status = initial, "initial contract status");

        if matches!(contract.contract_status(), Some(IN_REVISION | IN_SETUP)) {
            self.contract_action(guid, Action::Complete, None)?;
            contract = self.lookup_contract(guid)?;
        }

        if contract.contract_status() == Some(COMPLETE) {
            let approval = self.contract_action(guid, Action::Approve, Some(approve_message))?;
            if approval.ok() {
                contract = self.lookup_contract(guid)?;
            }
        }

        tracing::info!(
            contract = %contract_id,
            status = ?contract.contract_status(),
            "final contract status"
        );
        Ok(contract)
    }

    /// Take an adjustment through complete, approve and post
    ///
    /// `approve_message` is sent as the comment for both approve and post.
    pub fn complete_approve_post_adjustment(
        &self,
        guid: &str,
        approve_message: &str,
    ) -> Result<Adjustment, AlliantError> {
        let mut adjustment = self.lookup_adjustment(guid)?;
        if !adjustment.ok() {
            return Ok(adjustment);
        }
        let description = label(adjustment.result(), "description", guid);
        let initial = adjustment
            .adjustment_status()
            .ok_or(AlliantError::UnexpectedResult("statusReference.displayName"))?;
        tracing::info!(adjustment = %description, status = initial, "initial adjustment status");

        if adjustment.adjustment_status() == Some(IN_SETUP) {
            self.adjustment_action(guid, Action::Complete, None)?;
            adjustment = self.lookup_adjustment(guid)?;
        }

        if adjustment.adjustment_status() == Some(COMPLETE) {
            let approval = self.adjustment_action(guid, Action::Approve, Some(approve_message))?;
            if approval.ok() {
                adjustment = self.lookup_adjustment(guid)?;
            }
        }

        if adjustment.adjustment_status() == Some(APPROVED) {
            let posting = self.adjustment_action(guid, Action::Post, Some(approve_message))?;
            if posting.ok() {
                adjustment = self.lookup_adjustment(guid)?;
            }
        }

        tracing::info!(
            adjustment = %description,
            status = ?adjustment.adjustment_status(),
            "final adjustment status"
        );
        Ok(adjustment)
    }

    /// Delete a contract, revising it first when it is active
    pub fn delete_contract_with_revision(&self, guid: &str) -> Result<DeletionOutcome, AlliantError> {
        let mut contract = self.lookup_contract(guid)?;

        if contract.contract_status() == Some(ACTIVE) {
            self.contract_action(guid, Action::Revise, None)?;
            contract = self.lookup_contract(guid)?;
            tracing::info!(contract = guid, status = ?contract.contract_status(), "revised");
        }

        if !matches!(
            contract.contract_status(),
            Some(IN_REVISION | IN_SETUP | PRIOR_REVISION)
        ) {
            return Ok(DeletionOutcome::Skipped {
                status: contract.contract_status().map(str::to_string),
            });
        }

        let response = self.delete(ResourceKind::Contract, guid)?;
        if response.status().is_success() {
            tracing::info!(contract = guid, "deleted");
            Ok(DeletionOutcome::Deleted)
        } else {
            Ok(DeletionOutcome::Failed {
                status: response.status(),
                errors: response.errors().to_vec(),
            })
        }
    }
}
