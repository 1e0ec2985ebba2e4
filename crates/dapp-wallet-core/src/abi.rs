//! Dynamic ABI support for the invocation pipeline: function resolution,
//! JSON argument coercion, calldata encoding, and output decoding.

use std::str::FromStr;

use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, FixedBytes, B256, I256, U256};
use serde_json::Value;

/// Looks a function up by bare name or full signature. A full signature
/// (`"transfer(address,uint256)"`) disambiguates overloads; a bare name
/// picks the first candidate.
pub fn resolve_function<'a>(abi: &'a JsonAbi, method: &str) -> Result<&'a Function, String> {
    let (name, full_signature) = match method.split_once('(') {
        Some((name, _)) => (name, Some(method)),
        None => (method, None),
    };

    let candidates = abi
        .function(name)
        .ok_or_else(|| format!("function not found in abi: {name}"))?;

    if let Some(signature) = full_signature {
        return candidates
            .iter()
            .find(|f| f.signature() == signature)
            .ok_or_else(|| format!("function signature not found in abi: {signature}"));
    }
    candidates
        .first()
        .ok_or_else(|| format!("function has no candidates: {name}"))
}

/// Encodes calldata for `function` from JSON arguments, verifying the
/// selector of the encoded payload.
pub fn encode_call(function: &Function, args: &[Value]) -> Result<Bytes, String> {
    if function.inputs.len() != args.len() {
        return Err(format!(
            "argument count mismatch for {}: expected {}, got {}",
            function.name,
            function.inputs.len(),
            args.len()
        ));
    }

    let mut coerced = Vec::with_capacity(args.len());
    for (input, arg) in function.inputs.iter().zip(args.iter()) {
        let ty: DynSolType = input
            .ty
            .parse()
            .map_err(|e| format!("unsupported solidity type '{}': {e}", input.ty))?;
        let value = coerce_value(arg, &ty)
            .map_err(|e| format!("argument '{}' of {}: {e}", input.name, function.name))?;
        coerced.push(value);
    }

    let encoded = function
        .abi_encode_input(&coerced)
        .map_err(|e| format!("abi encoding failed: {e}"))?;
    if encoded.len() < 4 || encoded[0..4] != function.selector()[..] {
        return Err(format!("selector mismatch encoding {}", function.name));
    }
    Ok(Bytes::from(encoded))
}

/// Decodes a function's return data into dynamic values.
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, String> {
    function
        .abi_decode_output(data, false)
        .map_err(|e| format!("abi output decoding failed for {}: {e}", function.name))
}

/// topic0 for a named event, used to scope log filters.
pub fn event_topic(abi: &JsonAbi, event_name: &str) -> Result<B256, String> {
    abi.event(event_name)
        .and_then(|candidates| candidates.first())
        .map(|event| event.selector())
        .ok_or_else(|| format!("event not found in abi: {event_name}"))
}

fn coerce_value(value: &Value, ty: &DynSolType) -> Result<DynSolValue, String> {
    match ty {
        DynSolType::Bool => value
            .as_bool()
            .map(DynSolValue::Bool)
            .ok_or_else(|| "expected bool".to_owned()),
        DynSolType::Uint(bits) => coerce_uint(value).map(|x| DynSolValue::Uint(x, *bits)),
        DynSolType::Int(bits) => coerce_int(value).map(|x| DynSolValue::Int(x, *bits)),
        DynSolType::Address => value
            .as_str()
            .ok_or_else(|| "expected address string".to_owned())
            .and_then(|s| {
                Address::from_str(s)
                    .map(DynSolValue::Address)
                    .map_err(|e| format!("invalid address: {e}"))
            }),
        DynSolType::FixedBytes(size) => value
            .as_str()
            .ok_or_else(|| "expected fixed-bytes hex string".to_owned())
            .and_then(|s| {
                FixedBytes::from_str(s)
                    .map(|x| DynSolValue::FixedBytes(x, *size))
                    .map_err(|e| format!("invalid fixed bytes: {e}"))
            }),
        DynSolType::Bytes => value
            .as_str()
            .ok_or_else(|| "expected bytes hex string".to_owned())
            .and_then(|s| {
                Bytes::from_str(s)
                    .map(|x| DynSolValue::Bytes(x.into()))
                    .map_err(|e| format!("invalid bytes: {e}"))
            }),
        DynSolType::String => value
            .as_str()
            .map(|s| DynSolValue::String(s.to_owned()))
            .ok_or_else(|| "expected string".to_owned()),
        DynSolType::Array(inner) => {
            let entries = coerce_sequence(value, inner, None)?;
            Ok(DynSolValue::Array(entries))
        }
        DynSolType::FixedArray(inner, size) => {
            let entries = coerce_sequence(value, inner, Some(*size))?;
            Ok(DynSolValue::FixedArray(entries))
        }
        DynSolType::Tuple(inner) => {
            let entries = value
                .as_array()
                .ok_or_else(|| "expected array for tuple".to_owned())?;
            if entries.len() != inner.len() {
                return Err(format!(
                    "tuple length mismatch: expected {}, got {}",
                    inner.len(),
                    entries.len()
                ));
            }
            let mut out = Vec::with_capacity(entries.len());
            for (entry, entry_ty) in entries.iter().zip(inner.iter()) {
                out.push(coerce_value(entry, entry_ty)?);
            }
            Ok(DynSolValue::Tuple(out))
        }
        other => Err(format!("unsupported argument type: {other}")),
    }
}

fn coerce_sequence(
    value: &Value,
    inner: &DynSolType,
    expected_len: Option<usize>,
) -> Result<Vec<DynSolValue>, String> {
    let entries = value
        .as_array()
        .ok_or_else(|| "expected array".to_owned())?;
    if let Some(len) = expected_len {
        if entries.len() != len {
            return Err(format!(
                "fixed array length mismatch: expected {len}, got {}",
                entries.len()
            ));
        }
    }
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        out.push(coerce_value(entry, inner)?);
    }
    Ok(out)
}

fn coerce_uint(value: &Value) -> Result<U256, String> {
    match value {
        Value::String(s) => U256::from_str(s)
            .or_else(|_| U256::from_str_radix(s.trim_start_matches("0x"), 16))
            .map_err(|e| format!("invalid uint: {e}")),
        Value::Number(n) => {
            U256::from_str(&n.to_string()).map_err(|e| format!("invalid uint: {e}"))
        }
        _ => Err("expected uint string or number".to_owned()),
    }
}

fn coerce_int(value: &Value) -> Result<I256, String> {
    match value {
        Value::String(s) => I256::from_str(s).map_err(|e| format!("invalid int: {e}")),
        Value::Number(n) => {
            I256::from_str(&n.to_string()).map_err(|e| format!("invalid int: {e}"))
        }
        _ => Err("expected int string or number".to_owned()),
    }
}
