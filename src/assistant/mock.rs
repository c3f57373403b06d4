//! Canned assistant responses used when the API is unavailable.

use super::context::AnalysisContext;

struct ResponseSet {
    analysis_type: &'static str,
    /// Checked in order; first keyword found in the message wins.
    keyed: &'static [(&'static str, &'static str)],
    default: &'static str,
}

const RESPONSE_SETS: &[ResponseSet] = &[
    ResponseSet {
        analysis_type: "market-access",
        keyed: &[
            (
                "payer",
                "For {indication}, our analysis shows 45.2% commercial coverage with Medicare representing 32.8% of patients. Prior authorization requirements affect 78% of commercial plans, with an average approval time of 12 days. Key barriers include step therapy protocols and specialty pharmacy requirements.",
            ),
            (
                "coverage",
                "Coverage analysis for {indication} reveals strong formulary positioning across tier 2-3 placement. However, 23% of eligible patients face access barriers, primarily due to prior authorization delays and high copayment structures in certain markets.",
            ),
            (
                "cost",
                "Cost analysis indicates average monthly treatment costs of $12,500 for {indication}. Patient out-of-pocket costs vary significantly by payer, with commercial patients averaging $150/month vs Medicare patients at $85/month after coverage determinations.",
            ),
        ],
        default: "The market access landscape for {indication} shows strong overall coverage but with notable barriers in prior authorization processes. Would you like me to dive deeper into specific payer policies or geographic variations?",
    },
    ResponseSet {
        analysis_type: "treatment-pathway",
        keyed: &[
            (
                "pathway",
                "Treatment pathway analysis for {indication} shows 2,847 patients initiating first-line therapy, with 64% progressing to second-line treatment. Average time between lines is 8.3 months, with switching primarily driven by progression (67%) rather than tolerability (33%).",
            ),
            (
                "switching",
                "Switching patterns in {indication} reveal interesting trends: 35% of patients switch within the same class, while 65% move to different mechanism classes. Geographic variations show higher switching rates in academic medical centers vs community practices.",
            ),
            (
                "duration",
                "Treatment duration analysis shows median time on therapy of 14.2 months for {indication}. First-line persistence at 12 months is 78%, significantly above industry benchmarks. Key factors influencing duration include baseline disease characteristics and comorbidity burden.",
            ),
        ],
        default: "The treatment pathway for {indication} demonstrates strong persistence rates with logical progression patterns. What specific aspect of the patient journey would you like me to analyze further?",
    },
    ResponseSet {
        analysis_type: "persistency",
        keyed: &[
            (
                "adherence",
                "Persistency analysis for {indication} shows 78% of patients remaining on therapy at 12 months, which exceeds industry benchmarks by 15%. Key drivers of discontinuation include disease progression (45%), adverse events (28%), and access issues (17%).",
            ),
            (
                "discontinuation",
                "Discontinuation patterns in {indication} show early drop-off is primarily due to tolerability (first 3 months), while later discontinuation is driven by efficacy concerns. Regional variations suggest provider education opportunities in certain markets.",
            ),
            (
                "compliance",
                "Treatment compliance for {indication} is strong overall, with 85% of patients showing >80% medication possession ratio. Specialty pharmacy programs and patient support services contribute significantly to these positive persistence metrics.",
            ),
        ],
        default: "Persistency metrics for {indication} are performing well above benchmarks. The data suggests effective patient support programs and appropriate patient selection. What specific persistence factors would you like to explore?",
    },
];

/// Deterministic offline answer for `message` in `ctx`.
pub fn canned_response(ctx: &AnalysisContext, message: &str) -> String {
    let set = ctx
        .analysis_type
        .as_deref()
        .and_then(|t| RESPONSE_SETS.iter().find(|s| s.analysis_type == t))
        .unwrap_or(&RESPONSE_SETS[0]);

    let lower = message.to_lowercase();
    let template = set
        .keyed
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, response)| *response)
        .unwrap_or(set.default);

    template.replace("{indication}", ctx.indication_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(indication: &str, analysis_type: &str) -> AnalysisContext {
        AnalysisContext::new(Some(indication.to_string()), Some(analysis_type.to_string()))
    }

    #[test]
    fn test_keyword_match() {
        let response = canned_response(&ctx("Breast Cancer", "market-access"), "Which PAYER is hardest?");
        assert!(response.starts_with("For Breast Cancer, our analysis shows 45.2%"));
    }

    #[test]
    fn test_first_keyword_in_table_order_wins() {
        // "coverage" appears in the message before "payer", but payer is checked first.
        let response = canned_response(
            &ctx("AML", "market-access"),
            "coverage by payer",
        );
        assert!(response.starts_with("For AML, our analysis"));
    }

    #[test]
    fn test_default_per_type() {
        let response = canned_response(&ctx("AML", "persistency"), "tell me more");
        assert!(response.starts_with("Persistency metrics for AML"));
    }

    #[test]
    fn test_unknown_type_uses_market_access() {
        let response = canned_response(&ctx("AML", "care-gap"), "what does it cost?");
        assert!(response.starts_with("Cost analysis indicates"));
        assert!(response.contains("for AML."));
    }

    #[test]
    fn test_missing_indication() {
        let response = canned_response(&AnalysisContext::default(), "hello");
        assert!(response.contains("for this indication"));
        assert!(!response.contains("{indication}"));
    }
}
