use crate::error::DecodeError;
use crate::reference::{Reference, ReferenceDocument};
use crate::resource_type::ResourceType;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use std::ops::RangeInclusive;

/// Behaviour shared by the concrete, independently identified resources.
pub trait TypedResource {
    const RESOURCE_TYPE: ResourceType;

    fn id(&self) -> &str;

    fn reference(&self) -> Reference {
        Reference::new(Self::RESOURCE_TYPE, self.id())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

impl HumanName {
    pub fn new(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            text: None,
            family: Some(family.into()),
            given: vec![given.into()],
        }
    }

    pub fn first_given(&self) -> Option<&str> {
        self.given.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonDocument", into = "PersonDocument")]
pub struct Patient {
    pub id: String,
    pub name: Vec<HumanName>,
}

impl Patient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: HumanName) -> Self {
        self.name.push(name);
        self
    }

    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.first()
    }
}

impl TypedResource for Patient {
    const RESOURCE_TYPE: ResourceType = ResourceType::Patient;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonDocument", into = "PersonDocument")]
pub struct Doctor {
    pub id: String,
    pub name: Vec<HumanName>,
}

impl Doctor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: HumanName) -> Self {
        self.name.push(name);
        self
    }

    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.first()
    }
}

impl TypedResource for Doctor {
    const RESOURCE_TYPE: ResourceType = ResourceType::Doctor;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentDocument", into = "AppointmentDocument")]
pub struct Appointment {
    pub id: String,
    pub status: String,
    pub description: String,
    pub subject: Reference,
    pub actor: Reference,
    pub feedback: Option<Reference>,
    pub diagnosis: Option<Diagnosis>,
}

impl Appointment {
    pub fn new(
        id: impl Into<String>,
        status: impl Into<String>,
        description: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            description: description.into(),
            subject: Reference::new(ResourceType::Patient, patient_id),
            actor: Reference::new(ResourceType::Doctor, doctor_id),
            feedback: None,
            diagnosis: None,
        }
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback.is_some()
    }
}

impl TypedResource for Appointment {
    const RESOURCE_TYPE: ResourceType = ResourceType::Appointment;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DiagnosisDocument", into = "DiagnosisDocument")]
pub struct Diagnosis {
    pub id: String,
    pub status: String,
    pub name: String,
    pub appointment: Reference,
}

impl Diagnosis {
    pub fn new(
        id: impl Into<String>,
        status: impl Into<String>,
        name: impl Into<String>,
        appointment_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            name: name.into(),
            appointment: Reference::new(ResourceType::Appointment, appointment_id),
        }
    }
}

impl TypedResource for Diagnosis {
    const RESOURCE_TYPE: ResourceType = ResourceType::Diagnosis;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Patient feedback about one appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub recommend: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explained: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeling: Option<String>,
}

impl Feedback {
    pub const RECOMMEND_RANGE: RangeInclusive<u8> = 1..=10;

    pub fn new(recommend: u8) -> Self {
        Self {
            recommend,
            explained: None,
            feeling: None,
        }
    }

    pub fn with_explained(mut self, explained: bool) -> Self {
        self.explained = Some(explained);
        self
    }

    pub fn with_feeling(mut self, feeling: impl Into<String>) -> Self {
        self.feeling = Some(feeling.into());
        self
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if !Self::RECOMMEND_RANGE.contains(&self.recommend) {
            return Err(DecodeError::invalid_resource(
                ResourceType::Feedback,
                format!("recommend must be between 1 and 10, got {}", self.recommend),
            ));
        }
        Ok(())
    }
}

/// Transient container of resources. Never persisted itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub id: Option<String>,
    pub entries: Vec<Resource>,
}

impl Bundle {
    pub fn new(entries: Vec<Resource>) -> Self {
        Self { id: None, entries }
    }

    /// Number of concrete resources once nested bundles are expanded.
    pub fn resource_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Resource::Bundle(inner) => inner.resource_count(),
                _ => 1,
            })
            .sum()
    }
}

impl Serialize for Bundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            resource: &'a Resource,
        }

        #[derive(Serialize)]
        struct Out<'a> {
            #[serde(rename = "resourceType")]
            resource_type: ResourceType,
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a str>,
            entry: Vec<Entry<'a>>,
        }

        Out {
            resource_type: ResourceType::Bundle,
            id: self.id.as_deref(),
            entry: self
                .entries
                .iter()
                .map(|resource| Entry { resource })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bundle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Resource::deserialize(deserializer)? {
            Resource::Bundle(bundle) => Ok(bundle),
            other => Err(D::Error::custom(format!(
                "expected a Bundle, found {}",
                other.resource_type()
            ))),
        }
    }
}

/// Any decodable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Bundle(Bundle),
    Patient(Patient),
    Doctor(Doctor),
    Appointment(Appointment),
    Diagnosis(Diagnosis),
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Bundle(_) => ResourceType::Bundle,
            Resource::Patient(_) => ResourceType::Patient,
            Resource::Doctor(_) => ResourceType::Doctor,
            Resource::Appointment(_) => ResourceType::Appointment,
            Resource::Diagnosis(_) => ResourceType::Diagnosis,
        }
    }

    /// Resource ID. Bundles are not required to carry one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::Bundle(b) => b.id.as_deref(),
            Resource::Patient(p) => Some(&p.id),
            Resource::Doctor(d) => Some(&d.id),
            Resource::Appointment(a) => Some(&a.id),
            Resource::Diagnosis(d) => Some(&d.id),
        }
    }

    /// Expands bundles depth-first, preserving entry order.
    pub fn into_flattened(self) -> Vec<Resource> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }
}

fn flatten_into(resource: Resource, out: &mut Vec<Resource>) {
    match resource {
        Resource::Bundle(bundle) => {
            for entry in bundle.entries {
                flatten_into(entry, out);
            }
        }
        other => out.push(other),
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resource::Bundle(b) => b.serialize(serializer),
            Resource::Patient(p) => p.serialize(serializer),
            Resource::Doctor(d) => d.serialize(serializer),
            Resource::Appointment(a) => a.serialize(serializer),
            Resource::Diagnosis(d) => d.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::registry::decode_resource(value).map_err(D::Error::custom)
    }
}

impl From<Bundle> for Resource {
    fn from(value: Bundle) -> Self {
        Resource::Bundle(value)
    }
}

impl From<Patient> for Resource {
    fn from(value: Patient) -> Self {
        Resource::Patient(value)
    }
}

impl From<Doctor> for Resource {
    fn from(value: Doctor) -> Self {
        Resource::Doctor(value)
    }
}

impl From<Appointment> for Resource {
    fn from(value: Appointment) -> Self {
        Resource::Appointment(value)
    }
}

impl From<Diagnosis> for Resource {
    fn from(value: Diagnosis) -> Self {
        Resource::Diagnosis(value)
    }
}

// -------------------------
// Wire documents
// -------------------------

fn check_header(
    expected: ResourceType,
    found: Option<&str>,
    id: &str,
) -> Result<(), DecodeError> {
    if let Some(found) = found {
        if found != expected.as_str() {
            return Err(DecodeError::invalid_resource(
                expected,
                format!("resourceType is {found}"),
            ));
        }
    }
    if id.is_empty() {
        return Err(DecodeError::invalid_resource(expected, "id must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDocument {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
}

impl TryFrom<PersonDocument> for Patient {
    type Error = DecodeError;

    fn try_from(doc: PersonDocument) -> Result<Self, Self::Error> {
        check_header(ResourceType::Patient, doc.resource_type.as_deref(), &doc.id)?;
        Ok(Patient {
            id: doc.id,
            name: doc.name,
        })
    }
}

impl From<Patient> for PersonDocument {
    fn from(p: Patient) -> Self {
        Self {
            resource_type: Some(ResourceType::Patient.to_string()),
            id: p.id,
            name: p.name,
        }
    }
}

impl TryFrom<PersonDocument> for Doctor {
    type Error = DecodeError;

    fn try_from(doc: PersonDocument) -> Result<Self, Self::Error> {
        check_header(ResourceType::Doctor, doc.resource_type.as_deref(), &doc.id)?;
        Ok(Doctor {
            id: doc.id,
            name: doc.name,
        })
    }
}

impl From<Doctor> for PersonDocument {
    fn from(d: Doctor) -> Self {
        Self {
            resource_type: Some(ResourceType::Doctor.to_string()),
            id: d.id,
            name: d.name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeableText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDocument {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub service_type: Vec<CodeableText>,
    #[serde(default)]
    pub subject: ReferenceDocument,
    #[serde(default)]
    pub actor: ReferenceDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<ReferenceDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisDocument>,
}

impl TryFrom<AppointmentDocument> for Appointment {
    type Error = DecodeError;

    fn try_from(doc: AppointmentDocument) -> Result<Self, Self::Error> {
        check_header(ResourceType::Appointment, doc.resource_type.as_deref(), &doc.id)?;

        let description = doc
            .description
            .or_else(|| doc.service_type.into_iter().find_map(|t| t.text))
            .unwrap_or_default();
        let feedback = doc
            .feedback
            .map(|f| f.resolve("feedback", ResourceType::Feedback))
            .transpose()?;
        let diagnosis = doc.diagnosis.map(Diagnosis::try_from).transpose()?;

        Ok(Appointment {
            subject: doc.subject.resolve("subject", ResourceType::Patient)?,
            actor: doc.actor.resolve("actor", ResourceType::Doctor)?,
            id: doc.id,
            status: doc.status,
            description,
            feedback,
            diagnosis,
        })
    }
}

impl From<Appointment> for AppointmentDocument {
    fn from(a: Appointment) -> Self {
        Self {
            resource_type: Some(ResourceType::Appointment.to_string()),
            id: a.id,
            status: a.status,
            description: Some(a.description),
            service_type: Vec::new(),
            subject: a.subject.into(),
            actor: a.actor.into(),
            feedback: a.feedback.map(Into::into),
            diagnosis: a.diagnosis.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisDocument {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub appointment: ReferenceDocument,
}

/// Reads the display name from `code.coding[0]`, preferring `display` over `name`.
fn coding_display_name(code: &Value) -> Result<String, DecodeError> {
    let coding = code
        .get("coding")
        .ok_or_else(|| DecodeError::malformed_coding("code.coding is missing"))?;
    let entries = coding
        .as_array()
        .ok_or_else(|| DecodeError::malformed_coding("code.coding is not an array"))?;
    let first = entries
        .first()
        .ok_or_else(|| DecodeError::malformed_coding("code.coding is empty"))?;

    first
        .get("display")
        .and_then(Value::as_str)
        .or_else(|| first.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| DecodeError::malformed_coding("code.coding[0] has no display or name"))
}

impl TryFrom<DiagnosisDocument> for Diagnosis {
    type Error = DecodeError;

    fn try_from(doc: DiagnosisDocument) -> Result<Self, Self::Error> {
        check_header(ResourceType::Diagnosis, doc.resource_type.as_deref(), &doc.id)?;
        let name = coding_display_name(&doc.code)?;

        Ok(Diagnosis {
            appointment: doc
                .appointment
                .resolve("appointment", ResourceType::Appointment)?,
            id: doc.id,
            status: doc.status,
            name,
        })
    }
}

impl From<Diagnosis> for DiagnosisDocument {
    fn from(d: Diagnosis) -> Self {
        Self {
            resource_type: Some(ResourceType::Diagnosis.to_string()),
            id: d.id,
            status: d.status,
            code: json!({ "coding": [{ "display": d.name }] }),
            appointment: d.appointment.into(),
        }
    }
}
