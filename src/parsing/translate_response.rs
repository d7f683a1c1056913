use serde_json::Value;

/// Extracts the translated text from a `translate_a/single` response.
///
/// The body looks like `[[["Hola ","Hello ",...],["mundo","world",...]], null, "en", ...]`:
/// the first element holds one run per sentence fragment, and each run's first
/// entry is the translated fragment. Fragments are concatenated in order.
pub fn parse_translation(body: &str) -> Result<String, serde_json::Error> {
    let data: Value = serde_json::from_str(body)?;
    Ok(join_segments(&data))
}

/// Missing or oddly shaped runs contribute nothing rather than failing.
pub fn join_segments(data: &Value) -> String {
    data.get(0)
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get(0).and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
