//! JSON wire format for operations.
//!
//! ```text
//! {"clientId": 7, "hash": "<64 hex chars>", "ops": [2, "hi", -1]}
//! ```
//!
//! Positive integers retain, negative integers delete, strings insert.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::ids::{ClientId, ContentHash};
use crate::ops::Operation;
use crate::text::{Component, TextOp};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireOperation {
    client_id: ClientId,
    hash: ContentHash,
    ops: Vec<WireComponent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireComponent {
    Count(i64),
    Text(String),
}

impl TryFrom<WireComponent> for Component {
    type Error = Error;

    fn try_from(wire: WireComponent) -> Result<Self> {
        match wire {
            WireComponent::Count(0) => Err(Error::Decode("zero-length component".into())),
            WireComponent::Count(n) if n > 0 => Ok(Component::Retain(count(n.unsigned_abs())?)),
            WireComponent::Count(n) => Ok(Component::Delete(count(n.unsigned_abs())?)),
            WireComponent::Text(s) if s.is_empty() => {
                Err(Error::Decode("empty insert component".into()))
            }
            WireComponent::Text(s) => Ok(Component::Insert(s)),
        }
    }
}

/// Largest span a frame may describe; deletes must stay representable as a
/// negative `i64` on the way back out.
const MAX_SPAN: u64 = i64::MAX as u64;

fn count(n: u64) -> Result<usize> {
    if n > MAX_SPAN {
        return Err(Error::Decode(format!("component count {n} out of range")));
    }
    usize::try_from(n).map_err(|_| Error::Decode(format!("component count {n} out of range")))
}

/// Checks that the base and target lengths of `components` fit in
/// [`MAX_SPAN`], so merging them into a [`TextOp`] cannot overflow.
fn check_spans(components: &[Component]) -> Result<()> {
    let (mut base, mut target) = (0u64, 0u64);
    for component in components {
        let (consumed, produced) = match component {
            Component::Retain(n) => (*n as u64, *n as u64),
            Component::Delete(n) => (*n as u64, 0),
            Component::Insert(s) => (0, s.chars().count() as u64),
        };
        base = base
            .checked_add(consumed)
            .filter(|&total| total <= MAX_SPAN)
            .ok_or_else(|| Error::Decode("operation base length out of range".into()))?;
        target = target
            .checked_add(produced)
            .filter(|&total| total <= MAX_SPAN)
            .ok_or_else(|| Error::Decode("operation target length out of range".into()))?;
    }
    Ok(())
}

pub fn encode(op: &Operation) -> Vec<u8> {
    let ops: Vec<Value> = op
        .payload
        .components()
        .iter()
        .map(|c| match c {
            Component::Retain(n) => Value::from(*n),
            Component::Insert(s) => Value::from(s.as_str()),
            Component::Delete(n) => Value::from(-(*n as i64)),
        })
        .collect();
    json!({
        "clientId": op.client_id.0,
        "hash": op.hash.to_hex(),
        "ops": ops,
    })
    .to_string()
    .into_bytes()
}

pub fn decode(bytes: &[u8]) -> Result<Operation> {
    let wire: WireOperation =
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    let components = wire
        .ops
        .into_iter()
        .map(Component::try_from)
        .collect::<Result<Vec<_>>>()?;
    check_spans(&components)?;
    Ok(Operation::new(
        wire.client_id,
        wire.hash,
        TextOp::from_components(components),
    ))
}
