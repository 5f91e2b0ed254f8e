//! ProgrEval ontology vocabulary.
//!
//! IRIs here are data: they must match the published ontology byte for byte.

use super::GraphNode;

/// ProgrEval namespace.
pub const PROGREVAL_NS: &str = "urn:protege:ontology:progreval#";

/// Skill -> performance it employs.
pub const EMPLOYS_PERFORMANCE: &str = "empleaDesempeño";
/// Skill -> concept the performance is employed over.
pub const EMPLOYS_PERFORMANCE_OVER: &str = "empleaDesempeñoSobre";
/// Exemplar -> skill it requires.
pub const REQUIRES_SKILL: &str = "requiereManejoDe";

/// PREFIX block for queries typed without their own declarations.
pub const DEFAULT_PREFIXES: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>
";

/// A term in the ProgrEval namespace.
pub fn progreval(local: &str) -> GraphNode {
    GraphNode(format!("{PROGREVAL_NS}{local}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_terms_are_valid_iris() {
        for local in [EMPLOYS_PERFORMANCE, EMPLOYS_PERFORMANCE_OVER, REQUIRES_SKILL] {
            let node = progreval(local);
            assert!(GraphNode::parse(node.as_str()).is_ok(), "{node}");
        }
    }
}
