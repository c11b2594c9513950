pub mod error;
pub mod reference;
pub mod registry;
pub mod resource;
pub mod resource_type;

pub use error::{DecodeError, ErrorCategory, Result};
pub use reference::Reference;
pub use registry::{DecodeFn, ResourceRegistry, decode_reader, decode_resource, decode_slice};
pub use resource::{
    Appointment, Bundle, Diagnosis, Doctor, Feedback, HumanName, Patient, Resource, TypedResource,
};
pub use resource_type::ResourceType;
