#![forbid(unsafe_code)]

use rowsync_core::Scalar;
use rusqlite::types::Value;

pub(in crate::store) fn bind_values(params: &[Scalar]) -> Vec<Value> {
    params.iter().map(bind_value).collect()
}

fn bind_value(value: &Scalar) -> Value {
    match value {
        Scalar::Null => Value::Null,
        Scalar::Bool(flag) => Value::Integer(i64::from(*flag)),
        Scalar::Integer(number) => Value::Integer(*number),
        Scalar::Real(number) => Value::Real(*number),
        Scalar::Text(text) => Value::Text(text.clone()),
    }
}
