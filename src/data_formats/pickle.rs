// src/data_formats/pickle.rs
//
// Python pickle streams through the serde-pickle value model. Only the
// builtin types (None, bool, int, float, str, bytes, list, tuple, set, dict)
// are representable; pickled class instances fail to decode.

use serde_pickle::{DeOptions, SerOptions, Value};

use crate::error::BoxError;

pub fn decode(data: &[u8]) -> Result<Value, BoxError> {
    Ok(serde_pickle::value_from_slice(data, DeOptions::new())?)
}

pub fn encode(value: &Value) -> Result<Vec<u8>, BoxError> {
    Ok(serde_pickle::value_to_vec(value, SerOptions::new())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::HashableValue;
    use std::collections::BTreeMap;

    #[test]
    fn dict_round_trip() {
        let mut dict = BTreeMap::new();
        dict.insert(HashableValue::String("rows".into()), Value::I64(3));
        dict.insert(
            HashableValue::String("tags".into()),
            Value::List(vec![Value::String("a".into()), Value::None]),
        );
        let value = Value::Dict(dict);
        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn truncated_stream_fails() {
        let bytes = encode(&Value::String("abc".into())).unwrap();
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
    }
}
