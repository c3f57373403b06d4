//! Analysis context handed to the assistant.

use crate::models::Analysis;

/// Focus areas and metrics for one analysis type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextProfile {
    pub analysis_type: &'static str,
    pub context: &'static str,
    pub keywords: &'static [&'static str],
    pub metrics: &'static [&'static str],
}

pub const CONTEXT_PROFILES: &[ContextProfile] = &[
    ContextProfile {
        analysis_type: "market-access",
        context: "Market Access Analysis for healthcare indication",
        keywords: &["payer", "formulary", "prior authorization", "coverage", "access barriers", "reimbursement"],
        metrics: &["coverage percentage", "authorization approval rate", "time to approval", "step therapy requirements"],
    },
    ContextProfile {
        analysis_type: "referral-pattern",
        context: "Referral Pattern Analysis showing provider networks and patient flow",
        keywords: &["referral", "provider", "specialist", "primary care", "network", "geographic"],
        metrics: &["referral rate", "time to specialist", "provider concentration", "leakage rate"],
    },
    ContextProfile {
        analysis_type: "care-gap",
        context: "Care Gap Analysis identifying opportunities in patient care",
        keywords: &["care gap", "unmet need", "screening", "diagnosis delay", "treatment delay"],
        metrics: &["gap percentage", "time to diagnosis", "screening rate", "treatment uptake"],
    },
    ContextProfile {
        analysis_type: "treatment-pathway",
        context: "Treatment Pathway Analysis mapping patient treatment journeys",
        keywords: &["treatment line", "switching", "sequencing", "duration", "persistence", "adherence"],
        metrics: &["line progression", "switching rate", "treatment duration", "persistence rate"],
    },
    ContextProfile {
        analysis_type: "market-structure",
        context: "Market Structure Analysis of competitive landscape",
        keywords: &["market share", "competition", "competitive position", "brand performance"],
        metrics: &["market share percentage", "growth rate", "new patient share", "volume trends"],
    },
    ContextProfile {
        analysis_type: "persistency",
        context: "Treatment Persistency Analysis evaluating patient adherence",
        keywords: &["persistence", "adherence", "discontinuation", "compliance", "refill"],
        metrics: &["persistence rate", "discontinuation rate", "days on therapy", "refill rate"],
    },
];

/// Profile for `analysis_type`, market access when unknown or absent.
pub fn context_profile(analysis_type: Option<&str>) -> &'static ContextProfile {
    analysis_type
        .and_then(|t| CONTEXT_PROFILES.iter().find(|p| p.analysis_type == t))
        .unwrap_or(&CONTEXT_PROFILES[0])
}

/// What the user is currently looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    pub indication: Option<String>,
    pub analysis_type: Option<String>,
}

impl AnalysisContext {
    pub fn new(indication: Option<String>, analysis_type: Option<String>) -> Self {
        Self {
            indication,
            analysis_type,
        }
    }

    /// Context for an analysis, preferring its display name.
    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self {
            indication: analysis
                .indication_display_name
                .clone()
                .or_else(|| analysis.indication.clone()),
            analysis_type: analysis.analysis_type.clone(),
        }
    }

    pub fn profile(&self) -> &'static ContextProfile {
        context_profile(self.analysis_type.as_deref())
    }

    pub fn indication_label(&self) -> &str {
        self.indication.as_deref().unwrap_or("this indication")
    }

    pub fn analysis_type_label(&self) -> &str {
        self.analysis_type.as_deref().unwrap_or("general")
    }
}
