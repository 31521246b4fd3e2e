//! Typed observable events

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Decode configuration loaded from a file
    ConfigLoaded,
    /// Schema sources read from a directory
    SchemasLoaded,
    /// One schema compiled into the registry
    SchemaCompiled,
    /// Strict or try decode failed
    DecodeFailed,
    /// Partial decode stopped early
    DecodePartial,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaCompiled => "SCHEMA_COMPILED",
            Event::DecodeFailed => "DECODE_FAILED",
            Event::DecodePartial => "DECODE_PARTIAL",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaCompiled => Severity::Trace,
            Event::DecodeFailed | Event::DecodePartial => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in [
            Event::ConfigLoaded,
            Event::SchemasLoaded,
            Event::SchemaCompiled,
            Event::DecodeFailed,
            Event::DecodePartial,
        ] {
            assert!(event.as_str().chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_severities() {
        assert_eq!(Event::DecodeFailed.severity(), Severity::Warn);
        assert_eq!(Event::ConfigLoaded.severity(), Severity::Info);
        assert_eq!(format!("{}", Event::SchemaCompiled), "SCHEMA_COMPILED");
    }
}
