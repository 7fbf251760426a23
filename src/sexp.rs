//! S-expression plist helpers shared by config and frame parsing.
//!
//! Accepts both `Value::Keyword("key")` (elisp parser) and
//! `Value::Symbol(":key")` (default parser) forms for keys.

use lexpr::Value;

/// Parse a single s-expression.
pub fn parse(raw: &str) -> anyhow::Result<Value> {
    lexpr::from_str(raw).map_err(|e| anyhow::anyhow!("malformed s-expression: {e}"))
}

/// Look up the value following `:key` in a plist.
pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            // Value is the car of the next cons cell
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Whether a value reads as elisp `nil`.
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Null | Value::Nil | Value::Bool(false) => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Numeric value as f64.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// String, symbol or keyword value as text (leading `:` stripped).
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Keyword(k) => Some(k.to_string()),
        Value::Symbol(s) => Some(s.strip_prefix(':').unwrap_or(s).to_string()),
        _ => None,
    }
}

pub fn get_f64(value: &Value, key: &str) -> Option<f64> {
    get(value, key).and_then(as_f64)
}

pub fn get_text(value: &Value, key: &str) -> Option<String> {
    get(value, key).and_then(as_text)
}

/// Top-level elements of a proper or improper list.
///
/// `nil` and `()` yield an empty list; a non-list yields `None`.
pub fn list_items(value: &Value) -> Option<Vec<&Value>> {
    if is_nil(value) {
        return Some(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null | Value::Nil => return Some(items),
            _ if items.is_empty() => return None,
            other => {
                items.push(other);
                return Some(items);
            }
        }
    }
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_keyword_values() {
        let v = parse("(:a 1 :b \"two\" :c three)").unwrap();
        assert_eq!(get_f64(&v, "a"), Some(1.0));
        assert_eq!(get_text(&v, "b").as_deref(), Some("two"));
        assert_eq!(get_text(&v, "c").as_deref(), Some("three"));
        assert!(get(&v, "d").is_none());
    }

    #[test]
    fn test_get_key_without_value() {
        let v = parse("(:a 1 :b)").unwrap();
        assert!(get(&v, "b").is_none());
    }

    #[test]
    fn test_float_values() {
        let v = parse("(:x 0.25 :y -1.5)").unwrap();
        assert_eq!(get_f64(&v, "x"), Some(0.25));
        assert_eq!(get_f64(&v, "y"), Some(-1.5));
    }

    #[test]
    fn test_is_nil() {
        let v = parse("(:hand nil :other ())").unwrap();
        assert!(is_nil(get(&v, "hand").unwrap()));
        assert!(is_nil(get(&v, "other").unwrap()));
        assert!(!is_nil(&parse("(1)").unwrap()));
    }

    #[test]
    fn test_list_items() {
        let v = parse("((1 2 3) (4 5 6))").unwrap();
        let items = list_items(&v).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(list_items(items[1]).unwrap().len(), 3);
        assert!(list_items(&parse("42").unwrap()).is_none());
        assert_eq!(list_items(&parse("nil").unwrap()).unwrap().len(), 0);
    }

    #[test]
    fn test_malformed() {
        assert!(parse("(:a 1").is_err());
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_string(r"a\b"), r"a\\b");
    }
}
