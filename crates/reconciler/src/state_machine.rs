use core_model::node::{Node, ProvisionState};
use serde_json::Value;
use tracing::warn;

use bmc_client::{BmcClient, ProvisionVerb};

use crate::error::ReconcilerError;

/// Outcome of the BMC's interface validation check (management/boot
/// interfaces), as returned by `BmcClient::validate_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationOutcome {
    pub management: Validation,
    pub boot: Validation,
}

/// The transition the state machine would request next, given the
/// node's current provision state and its validation outcome (spec.md
/// §4.3: unchanged transition policy, mirroring the original's sequence
/// enroll/clean-failed -> manage -> manageable -> provide -> available).
/// A pure function so the policy itself is directly testable without a
/// live BMC.
pub fn decide_transition(state: ProvisionState, outcome: ValidationOutcome) -> Option<ProvisionVerb> {
    if outcome.management == Validation::Failed {
        return None;
    }
    match state {
        ProvisionState::Enroll | ProvisionState::CleanFailed => Some(ProvisionVerb::Manage),
        ProvisionState::Manageable if outcome.boot == Validation::Ok => Some(ProvisionVerb::Provide),
        ProvisionState::Available if outcome.boot == Validation::Failed => Some(ProvisionVerb::Manage),
        _ => None,
    }
}

/// Target state reached after `decide_transition`'s verb completes, used
/// to drive `wait_for_provision_state`.
fn target_state(verb: ProvisionVerb) -> ProvisionState {
    match verb {
        ProvisionVerb::Manage => ProvisionState::Manageable,
        ProvisionVerb::Provide => ProvisionState::Available,
        ProvisionVerb::Active => ProvisionState::Active,
        _ => ProvisionState::Error,
    }
}

/// Drives a single node forward by at most one transition step (the
/// original re-evaluates the whole chain on the next sweep rather than
/// looping synchronously within one pass).
pub async fn advance(
    bmc: &dyn BmcClient,
    uuid: &str,
    state: ProvisionState,
    outcome: ValidationOutcome,
    wait_timeout: std::time::Duration,
) -> Result<Option<ProvisionState>, ReconcilerError> {
    let Some(verb) = decide_transition(state, outcome) else {
        return Ok(None);
    };
    bmc.set_provision_state(uuid, verb, None).await?;
    let reached = bmc
        .wait_for_provision_state(uuid, target_state(verb), wait_timeout)
        .await?;
    Ok(Some(reached))
}

/// Open question resolution: when `instance_info.image_source` is absent
/// on the live Node but present as a JSON string in `extra.instance_info`,
/// restore it before deploy. Prefers live `instance_info` and logs a WARN
/// when the two disagree (spec.md §9).
pub fn rehydrate_image_source(node: &mut Node) {
    let live_has_image = node
        .instance_info
        .get("image_source")
        .and_then(Value::as_str)
        .is_some();

    let stashed: Option<Value> = node
        .extra
        .get("instance_info")
        .and_then(Value::as_str)
        .and_then(|s| serde_json::from_str(s).ok());

    let Some(stashed) = stashed else { return };
    let stashed_image = stashed.get("image_source").and_then(Value::as_str);

    if live_has_image {
        if let Some(stashed_image) = stashed_image {
            let live_image = node.instance_info.get("image_source").and_then(Value::as_str);
            if live_image != Some(stashed_image) {
                warn!(
                    node = %node.name,
                    live = live_image,
                    stashed = stashed_image,
                    "live instance_info.image_source disagrees with stashed copy; keeping live"
                );
            }
        }
        return;
    }

    if let Some(stashed_image) = stashed_image {
        node.instance_info
            .insert("image_source".to_string(), Value::String(stashed_image.to_string()));
    }
}
