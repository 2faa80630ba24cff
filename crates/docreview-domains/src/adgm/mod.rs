use docreview_core::types::{ChecklistRegistry, ReviewProfile};

use crate::checklist;

pub const COMPANY_INCORPORATION: &str = "Company Incorporation";

/// Documents ADGM expects in a company incorporation filing, in display order.
pub const INCORPORATION_DOCUMENTS: [&str; 7] = [
    "Articles of Association",
    "Memorandum of Association",
    "Board Resolution",
    "Shareholder Resolution",
    "Incorporation Application Form",
    "UBO Declaration Form",
    "Register of Members and Directors",
];

pub fn adgm_profile() -> ReviewProfile {
    ReviewProfile {
        name: "adgm".into(),
        label: "ADGM Corporate".into(),
        jurisdiction: "Abu Dhabi Global Market (ADGM)".into(),
        report_title: "ADGM Corporate Agent - Analysis Report".into(),
        classify_prompt: ADGM_CLASSIFY_PROMPT.into(),
        scan_prompt: ADGM_SCAN_PROMPT.into(),
        checklists: ChecklistRegistry::new(vec![checklist(
            COMPANY_INCORPORATION,
            &INCORPORATION_DOCUMENTS,
        )]),
    }
}

pub const ADGM_CLASSIFY_PROMPT: &str = r#"You are an AI assistant specializing in ADGM legal documents.
From the first chunk of the document '{DOC_NAME}' below, identify the document type and the likely legal process.

1.  **Document Type:** (e.g., Articles of Association, Board Resolution, Employment Contract, etc.)
2.  **Legal Process:** (e.g., Company Incorporation, Licensing, Employment, etc.)

Return ONLY a single, valid JSON object in the following format:
{
    "document_type": "string",
    "process": "string"
}

Here is the first chunk:
---
{EXCERPT}
---
"#;

pub const ADGM_SCAN_PROMPT: &str = r#"You are an AI-powered Corporate Agent specializing in Abu Dhabi Global Market (ADGM) jurisdiction.
Thoroughly analyze the entire legal document named '{DOC_NAME}' provided below. Your task is to identify all potential red flags based on ADGM Companies Regulations 2020.

Focus on these categories:
- **Incorrect Jurisdiction:** e.g., "courts of the UAE" instead of "ADGM Courts".
- **Ambiguous Language:** e.g., "will endeavor to" instead of "shall".
- **Missing Clauses:** e.g., no dispute resolution or governing law clause.
- **Formatting Errors:** e.g., placeholders like "[insert name]", typos like "RESOVED".
- **Non-ADGM Law References:** e.g., citing "UAE Federal Law No. 2 of 2015" without specifying ADGM regulations apply.

For each issue found, provide a section reference, a clear description, a severity level, and a precise suggestion for a fix.

Return ONLY a single, valid JSON object containing a list of the issues. The format must be:
{
  "issues_found": [
    {
      "document": "{DOC_NAME}",
      "section": "string (e.g., 'Clause 3.1' or 'General')",
      "issue": "string (Description of the red flag)",
      "severity": "string ('High', 'Medium', or 'Low')",
      "suggestion": "string (Recommendation for fixing the issue)"
    }
  ]
}

If no issues are found, return an empty list: {"issues_found": []}.

Here is the full document text:
---
{DOC_TEXT}
---
"#;
