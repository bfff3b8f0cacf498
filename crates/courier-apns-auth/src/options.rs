//! Per-notification APNs options: the `apns-*` request headers and the JSON
//! payload.
//!
//! Background and alert notifications are mutually exclusive in the payload:
//! once [`ApnsOptions::background`] is set, `aps` carries only
//! `content-available` and every alert field is dropped.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::alert::AlertOptions;
use crate::error::ApnsError;

/// `apns-push-type`
pub const APNS_PUSH_TYPE: HeaderName = HeaderName::from_static("apns-push-type");
/// `apns-id`
pub const APNS_ID: HeaderName = HeaderName::from_static("apns-id");
/// `apns-expiration`
pub const APNS_EXPIRATION: HeaderName = HeaderName::from_static("apns-expiration");
/// `apns-priority`
pub const APNS_PRIORITY: HeaderName = HeaderName::from_static("apns-priority");
/// `apns-topic`
pub const APNS_TOPIC: HeaderName = HeaderName::from_static("apns-topic");
/// `apns-collapse-id`
pub const APNS_COLLAPSE_ID: HeaderName = HeaderName::from_static("apns-collapse-id");

/// Deliver immediately.
pub const PRIORITY_IMMEDIATE: u8 = 10;
/// Deliver at a time that conserves power on the device.
pub const PRIORITY_LOW: u8 = 5;

/// `apns-push-type` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PushType {
    /// A visible notification.
    #[default]
    Alert,
    /// A silent content update.
    Background,
}

impl PushType {
    /// Header value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single notification to one device.
///
/// # Examples
///
/// ```
/// use courier_apns_auth::{AlertOptions, ApnsOptions};
/// use serde_json::json;
///
/// let options = ApnsOptions::new("device-token")
///     .badge(3)
///     .alert(AlertOptions::new().title("Hi"))
///     .priority(10)
///     .unwrap();
/// assert_eq!(options.payload(), json!({"aps": {"alert": {"title": "Hi"}, "badge": 3}}));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApnsOptions {
    recipient: String,
    push_type: PushType,
    id: Option<Uuid>,
    expiration: Option<DateTime<Utc>>,
    priority: Option<u8>,
    topic: Option<String>,
    collapse_id: Option<String>,
    background: bool,
    sound: Option<String>,
    badge: Option<u32>,
    category: Option<String>,
    thread_id: Option<String>,
    alert: Option<AlertOptions>,
    app_data: Map<String, Value>,
}

impl ApnsOptions {
    /// Options for the device identified by `recipient` (its device token).
    #[must_use]
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            ..Self::default()
        }
    }

    /// The device token.
    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// `apns-push-type`.
    #[must_use]
    pub fn push_type(mut self, push_type: PushType) -> Self {
        self.push_type = push_type;
        self
    }

    /// `apns-id`.
    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// `apns-id` set to a fresh random UUID.
    #[must_use]
    pub fn with_random_id(self) -> Self {
        self.id(Uuid::new_v4())
    }

    /// `apns-expiration`. Any time zone is accepted and normalized to UTC.
    #[must_use]
    pub fn expiration<Tz: TimeZone>(mut self, expiration: DateTime<Tz>) -> Self {
        self.expiration = Some(expiration.with_timezone(&Utc));
        self
    }

    /// `apns-priority`.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::InvalidPriority`] unless `priority` is
    /// [`PRIORITY_LOW`] or [`PRIORITY_IMMEDIATE`].
    pub fn priority(mut self, priority: u8) -> Result<Self, ApnsError> {
        if priority != PRIORITY_LOW && priority != PRIORITY_IMMEDIATE {
            return Err(ApnsError::InvalidPriority(priority));
        }
        self.priority = Some(priority);
        Ok(self)
    }

    /// `apns-topic`, normally the app's bundle id.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// `apns-collapse-id`.
    #[must_use]
    pub fn collapse_id(mut self, collapse_id: impl Into<String>) -> Self {
        self.collapse_id = Some(collapse_id.into());
        self
    }

    /// Mark as a background (content-available) notification.
    #[must_use]
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// `aps.sound`.
    #[must_use]
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// `aps.badge`.
    #[must_use]
    pub fn badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    /// `aps.category`.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// `aps.thread-id`.
    #[must_use]
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// `aps.alert`.
    #[must_use]
    pub fn alert(mut self, alert: AlertOptions) -> Self {
        self.alert = Some(alert);
        self
    }

    /// Add a top-level app-specific key. A later value for the same key
    /// replaces the earlier one.
    #[must_use]
    pub fn app_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.app_data.insert(key.into(), value.into());
        self
    }

    /// Build the JSON payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut payload = self.app_data.clone();
        let mut aps = Map::new();

        if self.background {
            aps.insert("content-available".to_owned(), Value::from(1));
            payload.insert("aps".to_owned(), Value::Object(aps));
            return Value::Object(payload);
        }

        let alert = self
            .alert
            .as_ref()
            .map_or_else(|| Value::String(String::new()), AlertOptions::to_value);
        aps.insert("alert".to_owned(), alert);
        if let Some(sound) = &self.sound {
            aps.insert("sound".to_owned(), Value::from(sound.as_str()));
        }
        if let Some(badge) = self.badge {
            aps.insert("badge".to_owned(), Value::from(badge));
        }
        if let Some(category) = &self.category {
            aps.insert("category".to_owned(), Value::from(category.as_str()));
        }
        if let Some(thread_id) = &self.thread_id {
            aps.insert("thread-id".to_owned(), Value::from(thread_id.as_str()));
        }

        payload.insert("aps".to_owned(), Value::Object(aps));
        Value::Object(payload)
    }

    /// Build the `apns-*` headers. Unset options produce no header.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::InvalidHeaderValue`] if the topic or collapse id
    /// cannot be carried in an HTTP header.
    pub fn headers(&self) -> Result<HeaderMap, ApnsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            APNS_PUSH_TYPE,
            HeaderValue::from_static(self.push_type.as_str()),
        );
        if let Some(id) = self.id {
            insert(&mut headers, APNS_ID, &id.hyphenated().to_string())?;
        }
        if let Some(expiration) = self.expiration {
            headers.insert(APNS_EXPIRATION, HeaderValue::from(expiration.timestamp()));
        }
        if let Some(priority) = self.priority {
            headers.insert(APNS_PRIORITY, HeaderValue::from(u16::from(priority)));
        }
        if let Some(topic) = &self.topic {
            insert(&mut headers, APNS_TOPIC, topic)?;
        }
        if let Some(collapse_id) = &self.collapse_id {
            insert(&mut headers, APNS_COLLAPSE_ID, collapse_id)?;
        }
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<(), ApnsError> {
    let value =
        HeaderValue::from_str(value).map_err(|_| ApnsError::InvalidHeaderValue(name.to_string()))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;

    fn full_alert() -> AlertOptions {
        AlertOptions::new()
            .title("title string")
            .body("body string")
            .localized_title_key("TITLE_KEY")
            .localized_title_args(["title arg1", "title arg2"])
            .localized_action_key("ACTION_KEY")
            .localized_message_key("MESSAGE_KEY")
            .localized_message_args(["message arg1", "message arg2"])
    }

    #[test]
    fn test_should_build_background_payload() {
        let options = ApnsOptions::new("recipient").background(true);
        assert_eq!(options.payload(), json!({"aps": {"content-available": 1}}));
    }

    #[test]
    fn test_should_keep_last_app_data_value() {
        let options = ApnsOptions::new("recipient")
            .background(true)
            .app_data("acme", json!(["acme data"]))
            .app_data("acme2", json!(["acme2 data"]))
            .app_data("acme", json!(["acme overrided data"]));
        assert_eq!(
            options.payload(),
            json!({
                "acme": ["acme overrided data"],
                "acme2": ["acme2 data"],
                "aps": {"content-available": 1},
            })
        );
    }

    #[test]
    fn test_should_default_to_empty_alert() {
        assert_eq!(
            ApnsOptions::new("recipient").payload(),
            json!({"aps": {"alert": ""}})
        );
        assert_eq!(
            ApnsOptions::new("recipient")
                .app_data("acme", json!(["acme data"]))
                .payload(),
            json!({"acme": ["acme data"], "aps": {"alert": ""}})
        );
    }

    #[test]
    fn test_should_place_sound_badge_category_and_thread() {
        let options = ApnsOptions::new("recipient")
            .sound("sound.aff")
            .badge(3)
            .category("INVITE")
            .thread_id("thread-id-1234");
        assert_eq!(
            options.payload(),
            json!({"aps": {
                "alert": "",
                "sound": "sound.aff",
                "badge": 3,
                "category": "INVITE",
                "thread-id": "thread-id-1234",
            }})
        );
    }

    #[test]
    fn test_should_serialize_aps_keys_in_insertion_order() {
        let options = ApnsOptions::new("recipient")
            .thread_id("thread-id-1234")
            .category("INVITE")
            .badge(3)
            .sound("sound.aff")
            .app_data("zeta", 1)
            .app_data("acme", "data");
        assert_eq!(
            serde_json::to_string(&options.payload()).unwrap(),
            concat!(
                r#"{"zeta":1,"acme":"data","aps":{"alert":"","sound":"sound.aff","#,
                r#""badge":3,"category":"INVITE","thread-id":"thread-id-1234"}}"#
            )
        );
    }

    #[test]
    fn test_should_build_full_alert_payload() {
        let options = ApnsOptions::new("recipient")
            .sound("sound.aff")
            .badge(3)
            .thread_id("thread-id-1234")
            .app_data("acme", json!(["acme data"]))
            .background(false)
            .alert(full_alert());
        assert_eq!(
            options.payload(),
            json!({
                "acme": ["acme data"],
                "aps": {
                    "alert": full_alert().to_value(),
                    "sound": "sound.aff",
                    "badge": 3,
                    "thread-id": "thread-id-1234",
                },
            })
        );
    }

    #[test]
    fn test_should_drop_alert_fields_when_background() {
        let options = ApnsOptions::new("recipient")
            .sound("sound.aff")
            .badge(3)
            .app_data("acme", json!(["acme data"]))
            .background(true)
            .alert(full_alert());
        assert_eq!(
            options.payload(),
            json!({"acme": ["acme data"], "aps": {"content-available": 1}})
        );
    }

    #[test]
    fn test_should_emit_only_push_type_by_default() {
        let headers = ApnsOptions::new("recipient").headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[APNS_PUSH_TYPE], "alert");
    }

    #[test]
    fn test_should_emit_all_headers() {
        let id = Uuid::parse_str("4e5a3b1c-2d3e-4f50-8a6b-7c8d9e0f1a2b").unwrap();
        let expiration = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2020, 5, 6, 12, 13, 14)
            .unwrap();
        let headers = ApnsOptions::new("recipient")
            .push_type(PushType::Background)
            .id(id)
            .expiration(expiration)
            .priority(PRIORITY_IMMEDIATE)
            .unwrap()
            .topic("<app.bundle.id>")
            .collapse_id("collapseid1234")
            .headers()
            .unwrap();

        assert_eq!(headers.len(), 6);
        assert_eq!(headers[APNS_PUSH_TYPE], "background");
        assert_eq!(headers[APNS_ID], "4e5a3b1c-2d3e-4f50-8a6b-7c8d9e0f1a2b");
        assert_eq!(headers[APNS_EXPIRATION], "1588759994");
        assert_eq!(headers[APNS_PRIORITY], "10");
        assert_eq!(headers[APNS_TOPIC], "<app.bundle.id>");
        assert_eq!(headers[APNS_COLLAPSE_ID], "collapseid1234");
    }

    #[test]
    fn test_should_normalize_expiration_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2020, 5, 6, 12, 13, 14)
            .unwrap();
        let utc = Utc.with_ymd_and_hms(2020, 5, 6, 10, 13, 14).unwrap();
        assert_eq!(
            ApnsOptions::new("r").expiration(offset),
            ApnsOptions::new("r").expiration(utc)
        );
    }

    #[test]
    fn test_should_accept_low_priority() {
        let headers = ApnsOptions::new("recipient")
            .priority(PRIORITY_LOW)
            .unwrap()
            .headers()
            .unwrap();
        assert_eq!(headers[APNS_PRIORITY], "5");
    }

    #[test]
    fn test_should_reject_other_priorities() {
        for priority in [0, 1, 6, 9, 11, 255] {
            assert!(matches!(
                ApnsOptions::new("recipient").priority(priority),
                Err(ApnsError::InvalidPriority(p)) if p == priority
            ));
        }
    }

    #[test]
    fn test_should_reject_topic_that_cannot_be_a_header() {
        let result = ApnsOptions::new("recipient").topic("bad\ntopic").headers();
        assert!(matches!(result, Err(ApnsError::InvalidHeaderValue(name)) if name == "apns-topic"));
    }

    #[test]
    fn test_should_generate_random_ids() {
        let a = ApnsOptions::new("r").with_random_id();
        let b = ApnsOptions::new("r").with_random_id();
        assert_ne!(a.headers().unwrap()[APNS_ID], b.headers().unwrap()[APNS_ID]);
    }
}
