// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The typed-params convenience for `Send` (§9 "Dynamic-named parameters").
//! A compile-time table keyed by `(actor_code, method_num)` describes the
//! expected JSON shape for a method's parameters; `Hex` callers already hand
//! over the chain-native encoding directly and skip the lookup.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamsCodec {
    Json,
    Hex,
}

/// The parameter shape for one `(actor_code, method_num)` pair. Only the
/// methods a deployment actually needs typed encoding for have to be listed
/// here; anything else falls through to [`encode`]'s JSON-passthrough arm.
#[derive(Clone, Copy, Debug)]
struct MethodShape {
    actor_code: &'static str,
    method_num: u64,
    /// `true` if the method takes no parameters at all (e.g. a plain
    /// value transfer).
    empty: bool,
}

const METHOD_TABLE: &[MethodShape] = &[MethodShape {
    actor_code: "fil/10/account",
    method_num: 0,
    empty: true,
}];

fn lookup(actor_code: &str, method_num: u64) -> Option<&'static MethodShape> {
    METHOD_TABLE
        .iter()
        .find(|m| m.actor_code == actor_code && m.method_num == method_num)
}

/// Resolves `raw` into the bytes stored on [`messager_core::message::UnsignedMessage::params`].
///
/// `Hex` params are already the chain-native encoding and pass through
/// untouched (after parsing the hex digits). `Json` params for a
/// method found in [`METHOD_TABLE`] with `empty: true` must be `null` or an
/// empty object; any other `Json` method is not modeled here and the raw
/// JSON bytes are carried through verbatim, matching the node's own
/// behavior when it doesn't recognize a params shape.
pub fn encode(actor_code: &str, method_num: u64, codec: ParamsCodec, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
    match codec {
        ParamsCodec::Hex => decode_hex(raw),
        ParamsCodec::Json => {
            if let Some(shape) = lookup(actor_code, method_num) {
                if shape.empty {
                    let value: serde_json::Value = if raw.is_empty() {
                        serde_json::Value::Null
                    } else {
                        serde_json::from_slice(raw)?
                    };
                    if !value.is_null() && value != serde_json::json!({}) {
                        anyhow::bail!("method {method_num} on {actor_code} takes no parameters");
                    }
                    return Ok(Vec::new());
                }
            }
            Ok(raw.to_vec())
        }
    }
}

fn decode_hex(raw: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(raw)?.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    if text.len() % 2 != 0 {
        anyhow::bail!("hex params must have an even number of digits");
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = (chunk[0] as char).to_digit(16).ok_or_else(|| anyhow::anyhow!("invalid hex digit"))?;
        let lo = (chunk[1] as char).to_digit(16).ok_or_else(|| anyhow::anyhow!("invalid hex digit"))?;
        out.push(((hi << 4) | lo) as u8);
    }
    Ok(out)
}
