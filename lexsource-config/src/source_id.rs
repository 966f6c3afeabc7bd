use serde::{Deserialize, Serialize};

/// The closed set of concrete sources this pipeline currently drives (§1).
/// The runtime itself (actors, Coordinator state machine) is source-agnostic;
/// this enum only exists so `JobConfig` and the source registry have
/// something concrete to key off of.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// A national gazette, indexed by publication date.
    NationalGazette,
    /// A supreme-court legislation portal, indexed by category/status.
    SupremeCourtPortal,
    /// An academic legal library, indexed by free-text search.
    AcademicLibrary,
    /// An international arbitration tribunal, indexed by category/date.
    ArbitrationTribunal,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::NationalGazette => "national_gazette",
            SourceId::SupremeCourtPortal => "supreme_court_portal",
            SourceId::AcademicLibrary => "academic_library",
            SourceId::ArbitrationTribunal => "arbitration_tribunal",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
