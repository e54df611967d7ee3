//! IAM policy documents for the execution role.

use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";
pub const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

/// The five data-plane actions the function needs on its table.
pub const TABLE_DATA_ACTIONS: [&str; 5] = [
    "dynamodb:PutItem",
    "dynamodb:GetItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:Scan",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Principal>,
    pub action: OneOrMany,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "Service")]
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl PolicyDocument {
    /// Trust policy naming `service` as the only principal allowed to assume the role.
    pub fn trust(service: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                effect: "Allow".to_string(),
                principal: Some(Principal {
                    service: service.to_string(),
                }),
                action: OneOrMany::One(ASSUME_ROLE_ACTION.to_string()),
                resource: None,
            }],
        }
    }

    /// Allows exactly [`TABLE_DATA_ACTIONS`] on a single table.
    pub fn table_access(region: &str, table_name: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                effect: "Allow".to_string(),
                principal: None,
                action: OneOrMany::Many(
                    TABLE_DATA_ACTIONS.iter().map(|a| a.to_string()).collect(),
                ),
                resource: Some(table_arn_pattern(region, table_name)),
            }],
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("policy documents always serialize")
    }
}

pub fn table_arn_pattern(region: &str, table_name: &str) -> String {
    format!("arn:aws:dynamodb:{region}:*:table/{table_name}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePolicy {
    pub name: String,
    pub document: PolicyDocument,
}
