// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Micheline JSON values, as accepted by the node's forge and origination RPCs.

use serde::{Deserialize, Serialize};

/// A Micheline expression in its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Micheline {
    Int {
        int: String,
    },
    String {
        string: String,
    },
    Bytes {
        bytes: String,
    },
    Prim {
        prim: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Micheline>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        annots: Vec<String>,
    },
    Seq(Vec<Micheline>),
}

impl Micheline {
    pub fn nat(value: u64) -> Self {
        Self::Int {
            int: value.to_string(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            string: value.into(),
        }
    }

    /// Bytes literal from an already hex-encoded value.
    pub fn bytes(hex_value: impl Into<String>) -> Self {
        Self::Bytes {
            bytes: hex_value.into(),
        }
    }

    fn prim(name: &str, args: Vec<Micheline>) -> Self {
        Self::Prim {
            prim: name.to_string(),
            args,
            annots: Vec::new(),
        }
    }

    pub fn pair(left: Micheline, right: Micheline) -> Self {
        Self::prim("Pair", vec![left, right])
    }

    pub fn left(value: Micheline) -> Self {
        Self::prim("Left", vec![value])
    }

    pub fn right(value: Micheline) -> Self {
        Self::prim("Right", vec![value])
    }

    /// Map entry; map literals must list entries in ascending key order.
    pub fn elt(key: Micheline, value: Micheline) -> Self {
        Self::prim("Elt", vec![key, value])
    }

    pub fn seq(items: Vec<Micheline>) -> Self {
        Self::Seq(items)
    }

    /// Empty map, set or list literal.
    pub fn empty() -> Self {
        Self::Seq(Vec::new())
    }
}

/// Entrypoint call arguments of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    pub entrypoint: String,
    pub value: Micheline,
}

impl Parameters {
    pub fn new(entrypoint: impl Into<String>, value: Micheline) -> Self {
        Self {
            entrypoint: entrypoint.into(),
            value,
        }
    }
}

/// Contract code and initial storage of an origination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub code: Micheline,
    pub storage: Micheline,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_node_json() {
        let value = Micheline::seq(vec![Micheline::pair(
            Micheline::string("tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb"),
            Micheline::nat(3),
        )]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!([{"prim": "Pair", "args": [
                {"string": "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb"},
                {"int": "3"}
            ]}])
        );
    }

    #[test]
    fn parses_contract_code() {
        let code = json!([
            {"prim": "parameter", "args": [{"prim": "nat", "annots": ["%mint"]}]},
            {"prim": "storage", "args": [{"prim": "unit"}]},
            {"prim": "code", "args": [[{"prim": "CDR"}, {"prim": "NIL", "args": [{"prim": "operation"}]}]]}
        ]);
        let parsed: Micheline = serde_json::from_value(code.clone()).unwrap();
        assert!(matches!(parsed, Micheline::Seq(ref items) if items.len() == 3));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), code);
    }
}
