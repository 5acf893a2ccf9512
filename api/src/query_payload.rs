use serde::{Deserialize, Deserializer, Serialize};

/// Fields are optional so a missing value can be answered with its own message
/// instead of a generic deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct QueryPayload {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveHistoryPayload {
    pub messages: Option<serde_json::Value>,
}

/// `chat_id` is `None` when the key is absent and `Some(None)` when it is `null`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteHistoryPayload {
    #[serde(default, deserialize_with = "present")]
    pub chat_id: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse<T> {
    pub response: T,
}

impl<T> MessageResponse<T> {
    pub fn new(response: T) -> Self {
        Self { response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_payload_tells_null_from_absent() {
        let absent: DeleteHistoryPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.chat_id, None);

        let null: DeleteHistoryPayload = serde_json::from_str(r#"{"chat_id": null}"#).unwrap();
        assert_eq!(null.chat_id, Some(None));

        let given: DeleteHistoryPayload =
            serde_json::from_str(r#"{"chat_id": "65f1c0ffee0000000000beef"}"#).unwrap();
        assert_eq!(given.chat_id, Some(Some("65f1c0ffee0000000000beef".to_string())));
    }
}
