//! Restoring submission order to batch replies.
//!
//! Nodes may answer a batch in any order. Replies are placed by an explicit
//! id to position map built from the submitted ids, so correctness does not
//! depend on how ids were assigned.

use crate::codec::SuccessResponse;
use crate::{Error, Result};
use std::collections::HashMap;

/// Reorders `responses` to match `call_order`.
///
/// Exactly one reply per submitted id is required.
///
/// # Errors
///
/// Returns [`Error::UnexpectedResponse`] if a reply carries an id that was not
/// submitted, if an id is answered twice, or if an id is left unanswered.
///
/// # Examples
///
/// ```
/// use rpclink::batch::restore_order;
/// use rpclink::codec::SuccessResponse;
/// use serde_json::json;
///
/// let responses = vec![
///     SuccessResponse { id: 3, result: json!("c") },
///     SuccessResponse { id: 1, result: json!("a") },
///     SuccessResponse { id: 2, result: json!("b") },
/// ];
///
/// let ordered = restore_order(responses, &[1, 2, 3]).unwrap();
/// let results: Vec<_> = ordered.into_iter().map(|r| r.result).collect();
/// assert_eq!(results, vec![json!("a"), json!("b"), json!("c")]);
/// ```
pub fn restore_order(
    responses: Vec<SuccessResponse>,
    call_order: &[u64],
) -> Result<Vec<SuccessResponse>> {
    let positions: HashMap<u64, usize> = call_order
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();

    let mut slots: Vec<Option<SuccessResponse>> = vec![None; call_order.len()];

    for response in responses {
        let position = *positions.get(&response.id).ok_or_else(|| {
            Error::UnexpectedResponse(format!("reply for unknown id {}", response.id))
        })?;

        let slot = &mut slots[position];
        if slot.is_some() {
            return Err(Error::UnexpectedResponse(format!(
                "duplicate reply for id {}",
                response.id
            )));
        }
        *slot = Some(response);
    }

    slots
        .into_iter()
        .zip(call_order)
        .map(|(slot, id)| {
            slot.ok_or_else(|| Error::UnexpectedResponse(format!("missing reply for id {}", id)))
        })
        .collect()
}
