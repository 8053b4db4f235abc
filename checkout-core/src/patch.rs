use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::checkout::DEFAULT_REFERENCE_ID;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// One JSON-patch operation against a processor order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

fn shipping_path() -> String {
    format!("/purchase_units/@reference_id=='{}'/shipping", DEFAULT_REFERENCE_ID)
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// Replaces the shipping block of the default purchase unit with the
    /// payer's selected option.
    pub fn shipping_option(selected: Value) -> Self {
        Self::replace(shipping_path(), json!({ "options": [selected] }))
    }

    pub fn shipping_address(address: Value) -> Self {
        Self::replace(format!("{}/address", shipping_path()), address)
    }
}
