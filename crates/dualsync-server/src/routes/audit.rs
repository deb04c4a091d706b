//! Cloud audit-log notification payloads
//!
//! Only the fields needed to locate the object are read:
//!
//! ```json
//! {
//!   "protoPayload": {
//!     "methodName": "storage.objects.create",
//!     "resourceName": "projects/_/buckets/photos/objects/2024/cat.jpg"
//!   },
//!   "resource": { "labels": { "bucket_name": "photos", "location": "asia-south1" } }
//! }
//! ```

use dualsync_core::types::{EventOperation, ReplicationEvent};
use dualsync_core::utils::validate_bucket_name;
use serde::Deserialize;

use super::IntakeError;

const OBJECTS_SEGMENT: &str = "/objects/";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub proto_payload: ProtoPayload,
    pub resource: AuditResource,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoPayload {
    #[serde(default)]
    pub method_name: Option<String>,
    pub resource_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditResource {
    pub labels: ResourceLabels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceLabels {
    pub bucket_name: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl AuditLogEntry {
    pub fn parse(body: &[u8]) -> Result<Self, IntakeError> {
        serde_json::from_slice(body).map_err(|e| IntakeError::InvalidPayload(e.to_string()))
    }

    /// Object key: everything after the first `/objects/` in the resource name
    pub fn object_key(&self) -> Result<&str, IntakeError> {
        self.proto_payload
            .resource_name
            .split_once(OBJECTS_SEGMENT)
            .map(|(_, key)| key)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                IntakeError::InvalidPayload(format!(
                    "resourceName has no object: {}",
                    self.proto_payload.resource_name
                ))
            })
    }

    pub fn into_event(self, operation: EventOperation) -> Result<ReplicationEvent, IntakeError> {
        let key = self.object_key()?.to_string();
        validate_bucket_name(&self.resource.labels.bucket_name)
            .map_err(|e| IntakeError::InvalidPayload(e.to_string()))?;
        Ok(ReplicationEvent::new(
            operation,
            self.resource.labels.bucket_name,
            key,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(resource_name: &str, bucket: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "protoPayload": {
                "methodName": "storage.objects.create",
                "resourceName": resource_name
            },
            "resource": { "labels": { "bucket_name": bucket, "location": "asia-south1" } }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_nested_key() {
        let entry = AuditLogEntry::parse(&body(
            "projects/_/buckets/photos/objects/2024/summer/cat.jpg",
            "photos",
        ))
        .unwrap();

        assert_eq!(entry.resource.labels.location.as_deref(), Some("asia-south1"));
        let event = entry.into_event(EventOperation::Create).unwrap();
        assert_eq!(event.source_bucket, "photos");
        assert_eq!(event.object_key, "2024/summer/cat.jpg");
        assert_eq!(event.operation, EventOperation::Create);
    }

    #[test]
    fn test_folder_marker_key_is_kept() {
        let event = AuditLogEntry::parse(&body("projects/_/buckets/photos/objects/2024/", "photos"))
            .unwrap()
            .into_event(EventOperation::Update)
            .unwrap();
        assert!(event.is_folder_marker());
    }

    #[test]
    fn test_rejects_bad_payloads() {
        assert!(AuditLogEntry::parse(b"not json").is_err());
        assert!(AuditLogEntry::parse(br#"{"protoPayload":{}}"#).is_err());

        let entry = AuditLogEntry::parse(&body("projects/_/buckets/photos", "photos")).unwrap();
        assert!(entry.into_event(EventOperation::Delete).is_err());

        let entry =
            AuditLogEntry::parse(&body("projects/_/buckets/photos/objects/k", "")).unwrap();
        assert!(entry.into_event(EventOperation::Delete).is_err());
    }

    #[test]
    fn test_rejects_bucket_names_that_leave_data_dir() {
        for bucket in ["..", "../etc", "photos/../../etc", "a\\b"] {
            let entry =
                AuditLogEntry::parse(&body("projects/_/buckets/x/objects/k", bucket)).unwrap();
            let err = entry.into_event(EventOperation::Create).unwrap_err();
            assert!(matches!(err, IntakeError::InvalidPayload(_)), "{}", bucket);
        }
    }
}
