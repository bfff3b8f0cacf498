//! The `aps.alert` dictionary.

use serde_json::{Map, Value};

/// Fields of a visible alert. Unset fields are left out of the payload.
///
/// # Examples
///
/// ```
/// use courier_apns_auth::AlertOptions;
///
/// let alert = AlertOptions::new().title("Hello").body("World");
/// assert_eq!(alert.to_value(), serde_json::json!({"title": "Hello", "body": "World"}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertOptions {
    title: Option<String>,
    body: Option<String>,
    title_loc_key: Option<String>,
    title_loc_args: Option<Vec<String>>,
    action_loc_key: Option<String>,
    loc_key: Option<String>,
    loc_args: Option<Vec<String>>,
}

impl AlertOptions {
    /// An empty alert.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `title`
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// `body`
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `title-loc-key`
    #[must_use]
    pub fn localized_title_key(mut self, key: impl Into<String>) -> Self {
        self.title_loc_key = Some(key.into());
        self
    }

    /// `title-loc-args`
    #[must_use]
    pub fn localized_title_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_loc_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// `action-loc-key`
    #[must_use]
    pub fn localized_action_key(mut self, key: impl Into<String>) -> Self {
        self.action_loc_key = Some(key.into());
        self
    }

    /// `loc-key`
    #[must_use]
    pub fn localized_message_key(mut self, key: impl Into<String>) -> Self {
        self.loc_key = Some(key.into());
        self
    }

    /// `loc-args`
    #[must_use]
    pub fn localized_message_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loc_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Render as the JSON object placed under `aps.alert`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let strings = [
            ("title", &self.title),
            ("body", &self.body),
            ("title-loc-key", &self.title_loc_key),
            ("action-loc-key", &self.action_loc_key),
            ("loc-key", &self.loc_key),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                map.insert(key.to_owned(), Value::String(value.clone()));
            }
        }
        let lists = [
            ("title-loc-args", &self.title_loc_args),
            ("loc-args", &self.loc_args),
        ];
        for (key, value) in lists {
            if let Some(values) = value {
                map.insert(
                    key.to_owned(),
                    Value::Array(values.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_render_full_alert() {
        let alert = AlertOptions::new()
            .title("title string")
            .body("body string")
            .localized_title_key("TITLE_KEY")
            .localized_title_args(["title arg1", "title arg2"])
            .localized_action_key("ACTION_KEY")
            .localized_message_key("MESSAGE_KEY")
            .localized_message_args(["message arg1", "message arg2"]);

        assert_eq!(
            alert.to_value(),
            json!({
                "title": "title string",
                "body": "body string",
                "title-loc-key": "TITLE_KEY",
                "title-loc-args": ["title arg1", "title arg2"],
                "action-loc-key": "ACTION_KEY",
                "loc-key": "MESSAGE_KEY",
                "loc-args": ["message arg1", "message arg2"],
            })
        );
    }

    #[test]
    fn test_should_render_empty_alert_as_empty_object() {
        assert_eq!(AlertOptions::new().to_value(), json!({}));
    }
}
