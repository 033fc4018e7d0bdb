//! Pipeline schema: which events exist, how their data renders, and which
//! stages open or close an instruction lifecycle.

use std::collections::{HashMap, HashSet};

use crate::error::{SchemaError, TraceError};

/// Datatype tag attached to each event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(from = "String", into = "String")
)]
pub enum EventType {
    /// Data is an encoded instruction and goes through the disassembler.
    InstBytes,
    /// Data is a program counter.
    Pc,
    /// Any other tag; data renders as a generic annotation.
    Other(String),
}

impl EventType {
    /// Tag text used in schema documents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InstBytes => "inst_bytes",
            Self::Pc => "pc",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        match tag {
            "inst_bytes" => Self::InstBytes,
            "pc" => Self::Pc,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// Schema file contents exactly as written: five parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SchemaDocument {
    /// Every event name the simulator emits.
    pub event_names: Vec<String>,
    /// Stages that begin an instruction in the rendered trace.
    pub start_stages: Vec<String>,
    /// Stages where an instruction may fork into speculative children.
    #[cfg_attr(feature = "serde", serde(default))]
    pub split_stages: Vec<String>,
    /// Stages that count as a successful retirement when they end a path.
    pub end_stages: Vec<String>,
    /// Datatype of each entry in `event_names`, aligned by position.
    pub event_types: Vec<EventType>,
}

/// Validated schema with constant-time stage lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    datatypes: HashMap<String, EventType>,
    start_stages: HashSet<String>,
    split_stages: HashSet<String>,
    end_stages: HashSet<String>,
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(document: SchemaDocument) -> Result<Self, Self::Error> {
        if document.event_names.len() != document.event_types.len() {
            return Err(SchemaError::LengthMismatch {
                names: document.event_names.len(),
                types: document.event_types.len(),
            });
        }

        let mut datatypes = HashMap::with_capacity(document.event_names.len());
        for (name, event_type) in document.event_names.into_iter().zip(document.event_types) {
            if datatypes.contains_key(&name) {
                return Err(SchemaError::DuplicateEvent(name));
            }
            datatypes.insert(name, event_type);
        }

        Ok(Self {
            datatypes,
            start_stages: document.start_stages.into_iter().collect(),
            split_stages: document.split_stages.into_iter().collect(),
            end_stages: document.end_stages.into_iter().collect(),
        })
    }
}

impl Schema {
    /// Returns the datatype for `stage`.
    ///
    /// # Errors
    ///
    /// [`TraceError::UnknownEventType`] when the schema does not list `stage`.
    pub fn datatype(&self, stage: &str) -> Result<&EventType, TraceError> {
        self.datatypes
            .get(stage)
            .ok_or_else(|| TraceError::UnknownEventType {
                stage: stage.to_string(),
            })
    }

    /// True when `stage` opens an instruction in the trace.
    #[must_use]
    pub fn is_start_stage(&self, stage: &str) -> bool {
        self.start_stages.contains(stage)
    }

    /// True when `stage` may fork into speculative children.
    #[must_use]
    pub fn is_split_stage(&self, stage: &str) -> bool {
        self.split_stages.contains(stage)
    }

    /// True when a path ending at `stage` retires rather than flushes.
    #[must_use]
    pub fn is_end_stage(&self, stage: &str) -> bool {
        self.end_stages.contains(stage)
    }
}

#[cfg(test)]
pub(crate) fn test_schema() -> Schema {
    let document = SchemaDocument {
        event_names: vec![
            "fetch".to_string(),
            "decode".to_string(),
            "issue".to_string(),
            "commit".to_string(),
        ],
        start_stages: vec!["fetch".to_string()],
        split_stages: vec!["decode".to_string()],
        end_stages: vec!["commit".to_string()],
        event_types: vec![
            EventType::Pc,
            EventType::InstBytes,
            EventType::from("rob_id"),
            EventType::from("rob_id"),
        ],
    };
    Schema::try_from(document).expect("test schema is well formed")
}

#[cfg(test)]
mod tests {
    use super::{test_schema, EventType, Schema, SchemaDocument};
    use crate::error::{SchemaError, TraceError};

    #[test]
    fn event_type_tags_round_trip() {
        for tag in ["inst_bytes", "pc", "rob_id"] {
            assert_eq!(EventType::from(tag).as_str(), tag);
        }
        assert_eq!(EventType::from("pc"), EventType::Pc);
    }

    #[test]
    fn stage_sets_are_queryable() {
        let schema = test_schema();
        assert!(schema.is_start_stage("fetch"));
        assert!(!schema.is_start_stage("commit"));
        assert!(schema.is_split_stage("decode"));
        assert!(schema.is_end_stage("commit"));
        assert_eq!(schema.datatype("decode").ok(), Some(&EventType::InstBytes));
    }

    #[test]
    fn missing_datatype_is_an_error() {
        let schema = test_schema();
        let error = schema.datatype("writeback").expect_err("not in schema");
        assert!(matches!(error, TraceError::UnknownEventType { stage } if stage == "writeback"));
    }

    #[test]
    fn misaligned_arrays_are_rejected() {
        let document = SchemaDocument {
            event_names: vec!["fetch".to_string(), "commit".to_string()],
            event_types: vec![EventType::Pc],
            ..SchemaDocument::default()
        };
        assert_eq!(
            Schema::try_from(document),
            Err(SchemaError::LengthMismatch { names: 2, types: 1 })
        );
    }

    #[test]
    fn duplicate_event_names_are_rejected() {
        let document = SchemaDocument {
            event_names: vec!["fetch".to_string(), "fetch".to_string()],
            event_types: vec![EventType::Pc, EventType::Pc],
            ..SchemaDocument::default()
        };
        assert_eq!(
            Schema::try_from(document),
            Err(SchemaError::DuplicateEvent("fetch".to_string()))
        );
    }
}
