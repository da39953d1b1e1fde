//! Endpoint table for the resource families exposed by the API

use std::fmt;
use std::str::FromStr;

use crate::error::AlliantError;

/// A resource family and where it lives under `/data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Adjustment headers
    Adjustment,
    /// Contracts
    Contract,
    /// Transaction characteristic `user1` .. `user20`
    TransactionCharacteristic(u8),
    /// Contacts
    Contact,
}

/// A status transition that can be requested on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Approve,
    Clear,
    ClearRequest,
    Complete,
    Copy,
    InSetup,
    Model,
    Post,
    Resolve,
    Revise,
}

const ADJUSTMENT_ACTIONS: &[Action] = &[
    Action::Approve,
    Action::Clear,
    Action::ClearRequest,
    Action::Copy,
    Action::InSetup,
    Action::Post,
    Action::Complete,
];

const CONTRACT_ACTIONS: &[Action] = &[
    Action::Approve,
    Action::Complete,
    Action::Copy,
    Action::InSetup,
    Action::Model,
    Action::Resolve,
    Action::Revise,
];

impl ResourceKind {
    /// Transaction characteristic `number`, checked against the 1..=20 range
    pub fn transaction_characteristic(number: u8) -> Result<Self, AlliantError> {
        if (1..=20).contains(&number) {
            Ok(Self::TransactionCharacteristic(number))
        } else {
            Err(AlliantError::InvalidTransactionCharacteristic(number))
        }
    }

    /// Path segments below the API root
    ///
    /// Fails for a transaction characteristic outside 1..=20, however the
    /// value was built.
    pub fn segments(&self) -> Result<Vec<String>, AlliantError> {
        let collection = match self {
            Self::Adjustment => "adjustmentHeaders".to_string(),
            Self::Contract => "contracts".to_string(),
            Self::TransactionCharacteristic(n) => {
                Self::transaction_characteristic(*n)?;
                format!("user{n}")
            }
            Self::Contact => "contacts".to_string(),
        };
        Ok(vec!["data".to_string(), collection])
    }

    /// Actions the API accepts for this resource
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Self::Adjustment => ADJUSTMENT_ACTIONS,
            Self::Contract => CONTRACT_ACTIONS,
            Self::TransactionCharacteristic(_) | Self::Contact => &[],
        }
    }

    /// Whether the API rejects `action` on this resource without a comment
    pub fn requires_comment(&self, action: Action) -> bool {
        match self {
            Self::Adjustment => matches!(action, Action::Approve | Action::ClearRequest),
            Self::Contract => matches!(action, Action::Approve),
            Self::TransactionCharacteristic(_) | Self::Contact => false,
        }
    }

    /// Check that `action` may be sent with the given comment
    pub fn validate_action(&self, action: Action, comment: Option<&str>) -> Result<(), AlliantError> {
        if !self.actions().contains(&action) {
            return Err(AlliantError::ActionNotSupported {
                resource: *self,
                action,
            });
        }
        if comment.is_none() && self.requires_comment(action) {
            return Err(AlliantError::CommentRequired {
                resource: *self,
                action,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adjustment => write!(f, "adjustment"),
            Self::Contract => write!(f, "contract"),
            Self::TransactionCharacteristic(n) => write!(f, "tc{n}"),
            Self::Contact => write!(f, "contact"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adjustment" | "adjustments" => Ok(Self::Adjustment),
            "contract" | "contracts" => Ok(Self::Contract),
            "contact" | "contacts" => Ok(Self::Contact),
            other => {
                let number = other
                    .strip_prefix("tc")
                    .or_else(|| other.strip_prefix("user"))
                    .and_then(|n| n.parse::<u8>().ok())
                    .ok_or_else(|| format!("unknown resource '{s}'"))?;
                Self::transaction_characteristic(number).map_err(|e| e.to_string())
            }
        }
    }
}

impl Action {
    /// Path segment used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Clear => "clear",
            Self::ClearRequest => "clearRequest",
            Self::Complete => "complete",
            Self::Copy => "copy",
            Self::InSetup => "insetup",
            Self::Model => "model",
            Self::Post => "post",
            Self::Resolve => "resolve",
            Self::Revise => "revise",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.to_ascii_lowercase().as_str() {
            "approve" => Self::Approve,
            "clear" => Self::Clear,
            "clearrequest" => Self::ClearRequest,
            "complete" => Self::Complete,
            "copy" => Self::Copy,
            "insetup" => Self::InSetup,
            "model" => Self::Model,
            "post" => Self::Post,
            "resolve" => Self::Resolve,
            "revise" => Self::Revise,
            _ => return Err(format!("unknown action '{s}'")),
        };
        Ok(action)
    }
}
