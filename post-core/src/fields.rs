use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use serde_json::{Number, Value};

use crate::error::FieldsError;
use crate::types::FieldMap;

/// Чтение снимка полей (JSON-объект)
pub fn read_fields<R: io::Read>(reader: R) -> Result<FieldMap, FieldsError> {
    let value: Value = serde_json::from_reader(BufReader::new(reader))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(FieldsError::NotAnObject),
    }
}

/// Чтение снимка полей из файла
pub fn read_fields_from_path(path: impl AsRef<Path>) -> Result<FieldMap, FieldsError> {
    let f = File::open(path)?;
    read_fields(f)
}

/// Следующая версия полей:
/// - дробные: +0.1 с округлением до 2 знаков
/// - целые: +1
/// - остальные типы не трогаем
pub fn bump_fields(fields: &mut FieldMap) {
    for value in fields.values_mut() {
        if let Value::Number(n) = value {
            if let Some(next) = bump_number(n) {
                *n = next;
            }
        }
    }
}

fn bump_number(n: &Number) -> Option<Number> {
    if let Some(u) = n.as_u64() {
        return u.checked_add(1).map(Number::from);
    }
    if let Some(i) = n.as_i64() {
        return i.checked_add(1).map(Number::from);
    }
    let f = n.as_f64()?;
    // округляем точное двоичное значение, ничья - к чётной цифре
    let rounded: f64 = format!("{:.2}", f + 0.1).parse().ok()?;
    Number::from_f64(rounded)
}
