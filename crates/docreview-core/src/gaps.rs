use crate::types::{ChecklistRegistry, ClassificationResult};

/// Outcome of comparing the uploaded document against its process checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapAnalysis {
    /// Size of the process checklist before the uploaded document is removed.
    pub required_documents: usize,
    /// Checklist entries not covered by the uploaded document, in checklist order.
    pub missing_documents: Vec<String>,
}

/// Determine which required documents are missing for the classified process.
///
/// The uploaded document covers at most one entry: the first whose lower-cased
/// name contains the lower-cased document type. Processes without a checklist
/// require nothing.
pub fn analyze_gaps(
    classification: &ClassificationResult,
    registry: &ChecklistRegistry,
) -> GapAnalysis {
    let Some(checklist) = registry.get(&classification.process) else {
        return GapAnalysis::default();
    };

    let mut missing = checklist.required.clone();
    let needle = classification.document_type.to_lowercase();
    if !needle.is_empty() {
        if let Some(pos) = missing
            .iter()
            .position(|entry| entry.to_lowercase().contains(&needle))
        {
            missing.remove(pos);
        }
    }

    GapAnalysis {
        required_documents: checklist.required.len(),
        missing_documents: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessChecklist;

    const INCORPORATION: &str = "Company Incorporation";

    fn registry() -> ChecklistRegistry {
        ChecklistRegistry::new(vec![ProcessChecklist {
            process: INCORPORATION.into(),
            required: [
                "Articles of Association",
                "Memorandum of Association",
                "Board Resolution",
                "Shareholder Resolution",
                "Incorporation Application Form",
                "UBO Declaration Form",
                "Register of Members and Directors",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }])
    }

    fn gaps(doc_type: &str, process: &str) -> GapAnalysis {
        analyze_gaps(&ClassificationResult::new(doc_type, process), &registry())
    }

    #[test]
    fn other_processes_require_nothing() {
        for (doc_type, process) in [
            ("Articles of Association", "Licensing"),
            ("Employment Contract", "Employment"),
            ("Unknown", "Unknown"),
            ("Board Resolution", "company incorporation"),
        ] {
            let g = gaps(doc_type, process);
            assert_eq!(g.required_documents, 0, "{process}");
            assert!(g.missing_documents.is_empty(), "{process}");
        }
    }

    #[test]
    fn exact_match_removes_one_entry() {
        let g = gaps("articles of association", INCORPORATION);
        assert_eq!(g.required_documents, 7);
        assert_eq!(g.missing_documents.len(), 6);
        assert!(!g.missing_documents.contains(&"Articles of Association".to_string()));
        assert_eq!(g.missing_documents[0], "Memorandum of Association");
    }

    #[test]
    fn no_match_keeps_full_checklist_in_order() {
        let g = gaps("Employment Contract", INCORPORATION);
        assert_eq!(g.required_documents, 7);
        assert_eq!(g.missing_documents, registry().checklists[0].required);
    }

    #[test]
    fn partial_match_removes_only_first_hit() {
        let g = gaps("Resolution", INCORPORATION);
        assert_eq!(g.missing_documents.len(), 6);
        assert!(!g.missing_documents.contains(&"Board Resolution".to_string()));
        assert!(g.missing_documents.contains(&"Shareholder Resolution".to_string()));
    }

    #[test]
    fn empty_document_type_matches_nothing() {
        let g = gaps("", INCORPORATION);
        assert_eq!(g.missing_documents.len(), 7);
    }

    #[test]
    fn document_type_longer_than_entry_does_not_match() {
        let g = gaps("Articles of Association (Amended)", INCORPORATION);
        assert_eq!(g.missing_documents.len(), 7);
    }
}
