//! Type-tag driven resource decoding.
//!
//! Every JSON resource carries a `resourceType` discriminator. The registry
//! maps each decodable discriminator to a decoder function; bundles re-enter
//! the registry for every entry so nested bundles decode recursively.

use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::error::DecodeError;
use crate::resource::{
    AppointmentDocument, Bundle, DiagnosisDocument, PersonDocument, Resource,
};
use crate::resource::{Appointment, Diagnosis, Doctor, Patient};
use crate::resource_type::ResourceType;

/// Decoder for one resource kind. Receives the registry so container kinds
/// can dispatch their children.
pub type DecodeFn = fn(&ResourceRegistry, Value) -> Result<Resource, DecodeError>;

// ============================================================================
// Registry
// ============================================================================

/// Maps `resourceType` discriminators to decoders.
#[derive(Clone)]
pub struct ResourceRegistry {
    decoders: HashMap<ResourceType, DecodeFn>,
}

impl ResourceRegistry {
    /// Create a registry with no decoders.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with decoders for every persisted kind plus Bundle.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ResourceType::Bundle, decode_bundle);
        registry.register(ResourceType::Patient, decode_patient);
        registry.register(ResourceType::Doctor, decode_doctor);
        registry.register(ResourceType::Appointment, decode_appointment);
        registry.register(ResourceType::Diagnosis, decode_diagnosis);
        registry
    }

    /// Process-wide default registry.
    pub fn global() -> &'static ResourceRegistry {
        static GLOBAL: OnceLock<ResourceRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ResourceRegistry::new)
    }

    /// Register (or replace) the decoder for a resource type.
    pub fn register(&mut self, resource_type: ResourceType, decoder: DecodeFn) {
        self.decoders.insert(resource_type, decoder);
    }

    pub fn supports(&self, resource_type: ResourceType) -> bool {
        self.decoders.contains_key(&resource_type)
    }

    /// Decode one resource from a JSON value.
    pub fn decode(&self, value: Value) -> Result<Resource, DecodeError> {
        let resource_type = discriminator(&value)?;
        let decoder = self
            .decoders
            .get(&resource_type)
            .ok_or_else(|| DecodeError::unknown_resource_type(resource_type.as_str()))?;

        trace!(resource_type = %resource_type, "decoding resource");
        decoder(self, value)
    }

    /// Decode the first top-level JSON value of a byte slice.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Resource, DecodeError> {
        self.decode(first_value(serde_json::Deserializer::from_slice(bytes))?)
    }

    /// Decode the first top-level JSON value of a reader. Anything after the
    /// first value is left unread.
    pub fn decode_reader<R: Read>(&self, reader: R) -> Result<Resource, DecodeError> {
        self.decode(read_first_value(reader)?)
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.decoders.keys().collect();
        kinds.sort();
        f.debug_struct("ResourceRegistry")
            .field("decoders", &kinds)
            .finish()
    }
}

/// Decode with the global registry.
pub fn decode_resource(value: Value) -> Result<Resource, DecodeError> {
    ResourceRegistry::global().decode(value)
}

/// Decode the first JSON value in `bytes` with the global registry.
pub fn decode_slice(bytes: &[u8]) -> Result<Resource, DecodeError> {
    ResourceRegistry::global().decode_slice(bytes)
}

/// Decode the first JSON value in `reader` with the global registry.
pub fn decode_reader<R: Read>(reader: R) -> Result<Resource, DecodeError> {
    ResourceRegistry::global().decode_reader(reader)
}

/// Reads exactly one top-level JSON value from a stream.
pub fn read_first_value<R: Read>(reader: R) -> Result<Value, DecodeError> {
    first_value(serde_json::Deserializer::from_reader(reader))
}

fn first_value<'de, R: serde_json::de::Read<'de>>(
    deserializer: serde_json::Deserializer<R>,
) -> Result<Value, DecodeError> {
    match deserializer.into_iter::<Value>().next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => Err(DecodeError::MalformedJson(err)),
        None => Err(DecodeError::MalformedJson(serde::de::Error::custom(
            "input contains no JSON value",
        ))),
    }
}

/// Extracts and parses the `resourceType` discriminator.
pub fn discriminator(value: &Value) -> Result<ResourceType, DecodeError> {
    let object = value.as_object().ok_or(DecodeError::NotAnObject {
        found: json_kind(value),
    })?;
    let tag = object
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingResourceType)?;
    tag.parse()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Decoders
// ============================================================================

fn document<T: DeserializeOwned>(
    resource_type: ResourceType,
    value: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::invalid_resource(resource_type, e))
}

fn decode_patient(_: &ResourceRegistry, value: Value) -> Result<Resource, DecodeError> {
    let doc: PersonDocument = document(ResourceType::Patient, value)?;
    Ok(Resource::Patient(Patient::try_from(doc)?))
}

fn decode_doctor(_: &ResourceRegistry, value: Value) -> Result<Resource, DecodeError> {
    let doc: PersonDocument = document(ResourceType::Doctor, value)?;
    Ok(Resource::Doctor(Doctor::try_from(doc)?))
}

fn decode_appointment(_: &ResourceRegistry, value: Value) -> Result<Resource, DecodeError> {
    let doc: AppointmentDocument = document(ResourceType::Appointment, value)?;
    Ok(Resource::Appointment(Appointment::try_from(doc)?))
}

fn decode_diagnosis(_: &ResourceRegistry, value: Value) -> Result<Resource, DecodeError> {
    let doc: DiagnosisDocument = document(ResourceType::Diagnosis, value)?;
    Ok(Resource::Diagnosis(Diagnosis::try_from(doc)?))
}

#[derive(Deserialize)]
struct BundleDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    entry: Vec<BundleEntryDocument>,
}

#[derive(Deserialize)]
struct BundleEntryDocument {
    #[serde(default)]
    resource: Value,
}

fn decode_bundle(registry: &ResourceRegistry, value: Value) -> Result<Resource, DecodeError> {
    let doc: BundleDocument = document(ResourceType::Bundle, value)?;

    let entries = doc
        .entry
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let id = entry
                .resource
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);
            registry
                .decode(entry.resource)
                .map_err(|e| DecodeError::bundle_entry(index, id, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Resource::Bundle(Bundle {
        id: doc.id,
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle_json() -> Value {
        json!({
            "resourceType": "Bundle",
            "id": "0c3151bd-1cbf-4d64-b04d-cd9187a4c6e0",
            "entry": [
                { "resource": {
                    "resourceType": "Patient",
                    "id": "6739ec3e-93bd-11eb-a8b3-0242ac130003",
                    "name": [{ "text": "Tendai Mahachi", "family": "Mahachi", "given": ["Tendai"] }]
                }},
                { "resource": {
                    "resourceType": "Doctor",
                    "id": "9bf9e532-93bd-11eb-a8b3-0242ac130003",
                    "name": [{ "family": "Careful", "given": ["Adam"] }]
                }},
                { "resource": {
                    "resourceType": "Appointment",
                    "id": "be142dc6-93bd-11eb-a8b3-0242ac130003",
                    "status": "finished",
                    "type": [{ "text": "Endocrinologist visit" }],
                    "subject": { "reference": "Patient/6739ec3e-93bd-11eb-a8b3-0242ac130003" },
                    "actor": { "reference": "Doctor/9bf9e532-93bd-11eb-a8b3-0242ac130003" }
                }},
                { "resource": {
                    "resourceType": "Diagnosis",
                    "id": "541a72a8-df75-4484-ac89-ac4923f03b81",
                    "status": "final",
                    "code": { "coding": [{
                        "system": "http://hl7.org/fhir/sid/icd-10",
                        "code": "E10-E14.9",
                        "name": "Diabetes without complications"
                    }]},
                    "appointment": { "reference": "Appointment/be142dc6-93bd-11eb-a8b3-0242ac130003" }
                }}
            ]
        })
    }

    #[test]
    fn test_decode_bundle_dispatches_each_entry() {
        let resource = ResourceRegistry::new().decode(bundle_json()).unwrap();
        let Resource::Bundle(bundle) = resource else {
            panic!("expected bundle");
        };
        let kinds: Vec<_> = bundle.entries.iter().map(Resource::resource_type).collect();
        assert_eq!(
            kinds,
            [
                ResourceType::Patient,
                ResourceType::Doctor,
                ResourceType::Appointment,
                ResourceType::Diagnosis
            ]
        );
        let Resource::Diagnosis(diagnosis) = &bundle.entries[3] else {
            panic!("expected diagnosis");
        };
        assert_eq!(diagnosis.name, "Diabetes without complications");
    }

    #[test]
    fn test_decode_nested_bundle() {
        let value = json!({
            "resourceType": "Bundle",
            "entry": [{ "resource": bundle_json() }, { "resource": {"resourceType": "Patient", "id": "p-2"} }]
        });
        let resource = decode_resource(value).unwrap();
        assert_eq!(resource.into_flattened().len(), 5);
    }

    #[test]
    fn test_unknown_resource_type() {
        let err = decode_resource(json!({"resourceType": "Encounter", "id": "e"})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownResourceType(ref t) if t == "Encounter"));
    }

    #[test]
    fn test_registered_type_without_decoder_is_unknown() {
        let err = decode_resource(json!({"resourceType": "Feedback", "recommend": 5})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownResourceType(ref t) if t == "Feedback"));
    }

    #[test]
    fn test_missing_resource_type() {
        let err = decode_resource(json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, DecodeError::MissingResourceType));

        let err = decode_resource(json!({"resourceType": 7})).unwrap_err();
        assert!(matches!(err, DecodeError::MissingResourceType));
    }

    #[test]
    fn test_not_an_object() {
        let err = decode_resource(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { found: "array" }));
    }

    #[test]
    fn test_bundle_entry_error_carries_index() {
        let value = json!({
            "resourceType": "Bundle",
            "entry": [
                { "resource": {"resourceType": "Patient", "id": "p"} },
                { "resource": {
                    "resourceType": "Appointment", "id": "a-bad",
                    "subject": {"reference": "Patient"},
                    "actor": {"reference": "Doctor/d"}
                }}
            ]
        });
        let err = decode_resource(value).unwrap_err();
        match err {
            DecodeError::BundleEntry { index, id, source } => {
                assert_eq!(index, 1);
                assert_eq!(id.as_deref(), Some("a-bad"));
                assert!(matches!(*source, DecodeError::InvalidReferenceFormat { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_diagnosis_with_empty_coding_fails() {
        let value = json!({
            "resourceType": "Diagnosis",
            "id": "dx",
            "status": "final",
            "code": { "coding": [] },
            "appointment": { "reference": "Appointment/a" }
        });
        let err = decode_resource(value).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedDiagnosisCoding { .. }));
    }

    #[test]
    fn test_decode_slice_reads_only_first_value() {
        let input = br#"{"resourceType": "Patient", "id": "first"} {"resourceType": "Patient", "id": "second"}"#;
        let resource = decode_slice(input).unwrap();
        assert_eq!(resource.id(), Some("first"));
    }

    #[test]
    fn test_decode_reader_malformed_json() {
        let err = decode_reader(&b"{\"resourceType\": "[..]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson(_)));

        let err = decode_reader(&b"   "[..]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson(_)));
    }

    #[test]
    fn test_resource_deserialize_uses_registry() {
        let resource: Resource = serde_json::from_value(bundle_json()).unwrap();
        assert_eq!(resource.resource_type(), ResourceType::Bundle);
        let round_tripped: Resource =
            serde_json::from_value(serde_json::to_value(&resource).unwrap()).unwrap();
        assert_eq!(round_tripped, resource);
    }

    #[test]
    fn test_custom_registry_can_drop_kinds() {
        let mut registry = ResourceRegistry::empty();
        registry.register(ResourceType::Patient, decode_patient);
        assert!(registry.supports(ResourceType::Patient));
        assert!(!registry.supports(ResourceType::Bundle));
        assert!(registry.decode(bundle_json()).is_err());
    }
}
