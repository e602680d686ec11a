//! Diagram type classification from the first significant source line.
//!
//! This is a heuristic for styling lookups and alt text, not a validator:
//! every input — malformed, empty, or exotic — classifies to exactly one
//! type, defaulting to [`DiagramType::Flowchart`].

use std::fmt;

/// Known mermaid diagram kinds, collapsed to the tags used for style lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Sequence,
    Class,
    State,
    Er,
    Gantt,
    Pie,
    Flowchart,
    Journey,
    Requirement,
    GitGraph,
}

impl DiagramType {
    /// Lowercase tag used for style-config lookup and image alt text.
    pub fn as_tag(self) -> &'static str {
        match self {
            DiagramType::Sequence => "sequence",
            DiagramType::Class => "classdiagram",
            DiagramType::State => "statediagram",
            DiagramType::Er => "erdiagram",
            DiagramType::Gantt => "gantt",
            DiagramType::Pie => "pie",
            DiagramType::Flowchart => "flowchart",
            DiagramType::Journey => "journey",
            DiagramType::Requirement => "requirement",
            DiagramType::GitGraph => "gitgraph",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// Ordered prefix table; first match wins. `stateDiagram-v2` collapses into
// the same tag as `stateDiagram` via the shared prefix.
const KEYWORD_TABLE: &[(&str, DiagramType)] = &[
    ("sequenceDiagram", DiagramType::Sequence),
    ("classDiagram", DiagramType::Class),
    ("stateDiagram", DiagramType::State),
    ("erDiagram", DiagramType::Er),
    ("gantt", DiagramType::Gantt),
    ("pie", DiagramType::Pie),
    ("graph", DiagramType::Flowchart),
    ("flowchart", DiagramType::Flowchart),
    ("journey", DiagramType::Journey),
    ("requirementDiagram", DiagramType::Requirement),
    ("gitGraph", DiagramType::GitGraph),
];

/// Classify a diagram source by its first non-blank, non-comment line.
///
/// Lines starting with the mermaid comment marker `%%` are skipped. Total:
/// any input yields exactly one type, defaulting to flowchart.
pub fn classify(source: &str) -> DiagramType {
    let first_line = source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"));

    let Some(first_line) = first_line else {
        return DiagramType::Flowchart;
    };

    for (keyword, diagram_type) in KEYWORD_TABLE {
        if first_line.starts_with(keyword) {
            return *diagram_type;
        }
    }

    DiagramType::Flowchart
}
