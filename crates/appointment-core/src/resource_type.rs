use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource kinds known to the appointment model.
///
/// `Bundle` is a transient container and `Feedback` only exists attached to an
/// appointment; neither is a standalone persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Bundle,
    Patient,
    Doctor,
    Appointment,
    Diagnosis,
    Feedback,
}

impl ResourceType {
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Bundle,
        ResourceType::Patient,
        ResourceType::Doctor,
        ResourceType::Appointment,
        ResourceType::Diagnosis,
        ResourceType::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Bundle => "Bundle",
            ResourceType::Patient => "Patient",
            ResourceType::Doctor => "Doctor",
            ResourceType::Appointment => "Appointment",
            ResourceType::Diagnosis => "Diagnosis",
            ResourceType::Feedback => "Feedback",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bundle" => Ok(ResourceType::Bundle),
            "Patient" => Ok(ResourceType::Patient),
            "Doctor" => Ok(ResourceType::Doctor),
            "Appointment" => Ok(ResourceType::Appointment),
            "Diagnosis" => Ok(ResourceType::Diagnosis),
            "Feedback" => Ok(ResourceType::Feedback),
            other => Err(DecodeError::unknown_resource_type(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_display_matches_parse() {
        for rt in ResourceType::ALL {
            assert_eq!(rt.to_string().parse::<ResourceType>().unwrap(), rt);
        }
    }

    #[test]
    fn test_unknown_resource_type() {
        let err = "Practitioner".parse::<ResourceType>().unwrap_err();
        assert!(matches!(err, DecodeError::UnknownResourceType(ref name) if name == "Practitioner"));
    }

    #[test]
    fn test_resource_type_is_case_sensitive() {
        assert!("patient".parse::<ResourceType>().is_err());
    }
}
