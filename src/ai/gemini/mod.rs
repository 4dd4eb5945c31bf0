pub mod client;
pub mod generator;
pub mod types;

pub use generator::GeminiGenerator;

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::MockBuilder;

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

    pub fn post_path_regex(regex: &str) -> MockBuilder {
        wiremock::Mock::given(method("POST")).and(path_regex(regex))
    }

    /// Frame JSON values as a `text/event-stream` body.
    pub fn sse_body(events: &[serde_json::Value]) -> Vec<u8> {
        events
            .iter()
            .map(|event| format!("data: {}\r\n\r\n", event))
            .collect::<String>()
            .into_bytes()
    }
}
