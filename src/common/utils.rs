use super::defs::*;
use crate::error::{AgentError, Result};
use serde_json::{Map, Value};

pub fn field<'a>(obj: &'a Value, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("missing '{key}' in {obj}")))
}

pub fn as_object<'a>(val: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    val.as_object()
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not an object")))
}

pub fn as_str<'a>(val: &'a Value, what: &str) -> Result<&'a str> {
    val.as_str()
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not a string")))
}

pub fn as_f64(val: &Value, what: &str) -> Result<Continuous> {
    val.as_f64()
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not a number")))
}

pub fn as_bool(val: &Value, what: &str) -> Result<bool> {
    val.as_bool()
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not a bool")))
}

pub fn as_discrete(val: &Value, what: &str) -> Result<Discrete> {
    val.as_i64()
        .and_then(|n| Discrete::try_from(n).ok())
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not an integer")))
}

pub fn as_discrete_vec(val: &Value, what: &str) -> Result<Vec<Discrete>> {
    as_array(val, what)?
        .iter()
        .map(|x| as_discrete(x, what))
        .collect()
}

pub fn as_continuous_vec(val: &Value, what: &str) -> Result<Vec<Continuous>> {
    as_array(val, what)?
        .iter()
        .map(|x| as_f64(x, what))
        .collect()
}

fn as_array<'a>(val: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    val.as_array()
        .ok_or_else(|| AgentError::UnexpectedResponse(format!("'{what}' is not an array")))
}
