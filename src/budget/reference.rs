// Parsing of numerator/denominator references ("key=value&key=value")

use crate::level::{Level, Params};
use regex::Regex;
use std::sync::OnceLock;

fn numeric_literal() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("numeric literal regex is valid"))
}

fn coerce(value: &str) -> Level {
    match value {
        "true" => Level::Bool(true),
        "false" => Level::Bool(false),
        _ if numeric_literal().is_match(value) => match value.parse::<f64>() {
            Ok(n) => Level::Number(n),
            Err(_) => Level::Text(value.to_string()),
        },
        _ => Level::Text(value.to_string()),
    }
}

/// Parse a reference string into a partial parameter assignment
///
/// Parts are separated by `&` and split on their first `=`; keys and values
/// are trimmed. `true`/`false` become booleans and plain decimal literals
/// become numbers; everything else stays a string. Empty parts, parts
/// without `=`, and parts with an empty key are skipped. A repeated key
/// keeps its last value.
///
/// # Example
/// ```
/// use perfbound::budget::parse_ref;
/// use perfbound::level::Level;
///
/// let params = parse_ref("diagnosticsLevel=full & sampling=true&ratio=0.5");
/// assert_eq!(params["diagnosticsLevel"], Level::from("full"));
/// assert_eq!(params["sampling"], Level::from(true));
/// assert_eq!(params["ratio"], Level::from(0.5));
/// ```
pub fn parse_ref(reference: &str) -> Params {
    let mut out = Params::new();
    for part in reference.split('&') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), coerce(value.trim()));
    }
    out
}
