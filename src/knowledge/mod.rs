//! Patient-journey rule knowledge base.
//!
//! Static, read-only tables of disease-specific rules (HER2+ breast cancer
//! and AML). They are never executed; they are looked up and rendered as
//! text for prompt enrichment.

mod tables;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Map that serializes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(&'static str, V)>);

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugClassifications {
    #[serde(rename = "HER2_backbone")]
    pub her2_backbone: Vec<&'static str>,
    pub chemotherapy: Chemotherapy,
    pub hormonal_therapy: HormonalTherapy,
    pub targeted_other: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chemotherapy {
    pub platin_based: Vec<&'static str>,
    pub taxane_based: Vec<&'static str>,
    pub other_chemos: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HormonalTherapy {
    pub aromatase_inhibitors: Vec<&'static str>,
    pub cdk_inhibitors: Vec<&'static str>,
}

/// How episodes or regimens are derived from claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessDefinition {
    pub definition: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Criteria {
    One(&'static str),
    Many(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentPhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Criteria>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_criteria: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_phases: Option<Vec<&'static str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SctConsiderations {
    pub description: &'static str,
    pub timing: &'static str,
    pub impact: &'static str,
}

/// Everything known about one indication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicationKnowledge {
    #[serde(skip)]
    pub key: &'static str,
    #[serde(skip)]
    pub display_name: &'static str,
    /// Normalized indication names that resolve to this entry.
    #[serde(skip)]
    pub aliases: Vec<&'static str>,
    pub patient_funnel_rules: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backbone_drugs: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug_classifications: Option<DrugClassifications>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_progression_rules: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_creation: Option<ProcessDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regimen_creation: Option<ProcessDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_phases: Option<OrderedMap<TreatmentPhase>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salvage_drugs: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_transitions: Option<OrderedMap<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sct_considerations: Option<SctConsiderations>,
}

/// Which slice of an indication's rules a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    PatientFunnel,
    DrugClassifications,
    ProgressionRules,
    TreatmentPhases,
    BackboneDrugs,
    All,
}

impl From<&str> for QueryType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().replace('-', "_").as_str() {
            "patient_funnel" => QueryType::PatientFunnel,
            "drug_classifications" => QueryType::DrugClassifications,
            "progression_rules" => QueryType::ProgressionRules,
            "treatment_phases" => QueryType::TreatmentPhases,
            "backbone_drugs" => QueryType::BackboneDrugs,
            _ => QueryType::All,
        }
    }
}

/// A resolved piece of an indication's knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeSection<'a> {
    Rules(&'a [&'static str]),
    DrugList(&'a [&'static str]),
    DrugClassifications(&'a DrugClassifications),
    TreatmentPhases(&'a OrderedMap<TreatmentPhase>),
    Full(&'a IndicationKnowledge),
}

impl KnowledgeSection<'_> {
    /// Lists one item per line; structured tables as pretty JSON.
    pub fn render(&self) -> String {
        match self {
            KnowledgeSection::Rules(items) | KnowledgeSection::DrugList(items) => items.join("\n"),
            KnowledgeSection::DrugClassifications(table) => to_pretty_json(table),
            KnowledgeSection::TreatmentPhases(phases) => to_pretty_json(phases),
            KnowledgeSection::Full(knowledge) => to_pretty_json(knowledge),
        }
    }
}

impl fmt::Display for KnowledgeSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    // Static tables of strings always serialize.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Turn a free-form indication name into a lookup key:
/// lowercase, runs of non-alphanumerics collapsed to `_`, trimmed.
pub fn normalize_indication(indication: &str) -> String {
    let mut key = String::with_capacity(indication.len());
    for ch in indication.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            key.push(ch.to_ascii_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}

/// Lookup over the built-in rule tables.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    indications: Vec<IndicationKnowledge>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The HER2+ breast cancer and AML tables.
    pub fn builtin() -> Self {
        Self {
            indications: vec![tables::her2_breast_cancer(), tables::aml()],
        }
    }

    pub fn indications(&self) -> &[IndicationKnowledge] {
        &self.indications
    }

    /// Resolve an indication name (any casing/punctuation, or an alias).
    pub fn lookup(&self, indication: &str) -> Option<&IndicationKnowledge> {
        let key = normalize_indication(indication);
        if key.is_empty() {
            return None;
        }
        self.indications
            .iter()
            .find(|k| k.key == key || k.aliases.iter().any(|alias| *alias == key))
    }

    /// The section of an indication's rules matching `query_type`.
    ///
    /// Drug classifications fall back to the salvage drug list and
    /// progression rules fall back to treatment phases for indications that
    /// model those instead.
    pub fn relevant_knowledge(&self, indication: &str, query_type: QueryType) -> Option<KnowledgeSection<'_>> {
        let knowledge = self.lookup(indication)?;

        match query_type {
            QueryType::PatientFunnel => Some(KnowledgeSection::Rules(&knowledge.patient_funnel_rules)),
            QueryType::DrugClassifications => knowledge
                .drug_classifications
                .as_ref()
                .map(KnowledgeSection::DrugClassifications)
                .or_else(|| knowledge.salvage_drugs.as_deref().map(KnowledgeSection::DrugList)),
            QueryType::ProgressionRules => knowledge
                .lot_progression_rules
                .as_deref()
                .map(KnowledgeSection::Rules)
                .or_else(|| knowledge.treatment_phases.as_ref().map(KnowledgeSection::TreatmentPhases)),
            QueryType::TreatmentPhases => knowledge
                .treatment_phases
                .as_ref()
                .map(KnowledgeSection::TreatmentPhases),
            QueryType::BackboneDrugs => knowledge.backbone_drugs.as_deref().map(KnowledgeSection::DrugList),
            QueryType::All => Some(KnowledgeSection::Full(knowledge)),
        }
    }

    /// Prompt context for `indication`, containing only the rule sections
    /// whose topic keywords appear in `query`. Empty for unknown indications.
    pub fn llm_context(&self, indication: &str, query: &str) -> String {
        let Some(knowledge) = self.lookup(indication) else {
            return String::new();
        };

        let query = query.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| query.contains(w));
        let mut context = format!("Based on validated Patient Journey Rules for {}:\n\n", indication);

        if mentions(&["patient", "cohort", "inclusion"]) {
            let rules = if knowledge.patient_funnel_rules.is_empty() {
                "No specific rules found".to_string()
            } else {
                knowledge.patient_funnel_rules.join("\n")
            };
            context.push_str(&format!("Patient Funnel Rules:\n{}\n\n", rules));
        }

        if mentions(&["drug", "treatment", "therapy"]) {
            if let Some(drugs) = &knowledge.backbone_drugs {
                context.push_str(&format!("HER2+ Backbone Drugs: {}\n\n", drugs.join(", ")));
            }
            if let Some(drugs) = &knowledge.salvage_drugs {
                context.push_str(&format!("AML Salvage Drugs: {}\n\n", drugs.join(", ")));
            }
            if let Some(table) = &knowledge.drug_classifications {
                context.push_str(&format!("Drug Classifications:\n{}\n\n", to_pretty_json(table)));
            }
        }

        if mentions(&["line", "progression", "episode", "phase"]) {
            if let Some(rules) = &knowledge.lot_progression_rules {
                context.push_str(&format!(
                    "Line of Therapy Progression Rules:\n{}\n\n",
                    rules.join("\n")
                ));
            }
            if let Some(phases) = &knowledge.treatment_phases {
                context.push_str(&format!("Treatment Phases:\n{}\n\n", to_pretty_json(phases)));
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_indication() {
        assert_eq!(normalize_indication("HER2+ Breast Cancer"), "her2_breast_cancer");
        assert_eq!(normalize_indication("  AML "), "aml");
        assert_eq!(normalize_indication("Acute Myeloid-Leukemia"), "acute_myeloid_leukemia");
        assert_eq!(normalize_indication("+++"), "");
    }

    #[test]
    fn test_lookup_aliases() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.lookup("Breast Cancer").unwrap().key, "her2_breast_cancer");
        assert_eq!(kb.lookup("her2_breast_cancer").unwrap().key, "her2_breast_cancer");
        assert_eq!(kb.lookup("Acute Myeloid Leukemia").unwrap().key, "aml");
        assert!(kb.lookup("Psoriasis").is_none());
        assert!(kb.lookup("").is_none());
    }

    #[test]
    fn test_query_type_parsing() {
        assert_eq!(QueryType::from("patient_funnel"), QueryType::PatientFunnel);
        assert_eq!(QueryType::from("backbone-drugs"), QueryType::BackboneDrugs);
        assert_eq!(QueryType::from("whatever"), QueryType::All);
    }

    #[test]
    fn test_relevant_knowledge_her2() {
        let kb = KnowledgeBase::builtin();

        match kb.relevant_knowledge("Breast Cancer", QueryType::PatientFunnel) {
            Some(KnowledgeSection::Rules(rules)) => assert_eq!(rules.len(), 7),
            other => panic!("unexpected section: {:?}", other),
        }
        match kb.relevant_knowledge("Breast Cancer", QueryType::ProgressionRules) {
            Some(KnowledgeSection::Rules(rules)) => {
                assert!(rules[0].contains("Perjeta + Herceptin"));
                assert_eq!(rules.len(), 9);
            }
            other => panic!("unexpected section: {:?}", other),
        }
        assert!(matches!(
            kb.relevant_knowledge("Breast Cancer", QueryType::DrugClassifications),
            Some(KnowledgeSection::DrugClassifications(_))
        ));
        assert!(kb
            .relevant_knowledge("Breast Cancer", QueryType::TreatmentPhases)
            .is_none());
    }

    #[test]
    fn test_relevant_knowledge_aml_fallbacks() {
        let kb = KnowledgeBase::builtin();

        match kb.relevant_knowledge("AML", QueryType::DrugClassifications) {
            Some(KnowledgeSection::DrugList(drugs)) => assert!(drugs.contains(&"Gilteritinib")),
            other => panic!("unexpected section: {:?}", other),
        }
        match kb.relevant_knowledge("AML", QueryType::ProgressionRules) {
            Some(KnowledgeSection::TreatmentPhases(phases)) => {
                let keys: Vec<&str> = phases.keys().collect();
                assert_eq!(
                    keys,
                    vec!["induction", "consolidation", "maintenance", "refractory", "relapse", "second_relapse"]
                );
                assert_eq!(
                    phases.get("maintenance").unwrap().end_criteria,
                    Some("Ends at Relapse Dx")
                );
            }
            other => panic!("unexpected section: {:?}", other),
        }
        assert!(kb.relevant_knowledge("AML", QueryType::BackboneDrugs).is_none());
        assert!(kb.relevant_knowledge("Unknown", QueryType::All).is_none());
    }

    #[test]
    fn test_full_section_renders_json() {
        let kb = KnowledgeBase::builtin();
        let rendered = kb.relevant_knowledge("AML", QueryType::All).unwrap().render();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["sct_considerations"]["description"], "Stem Cell Transplant");
        assert!(value.get("backbone_drugs").is_none());
        assert!(value.get("key").is_none());
    }

    #[test]
    fn test_treatment_phase_json_shape() {
        let kb = KnowledgeBase::builtin();
        let phases = kb.lookup("aml").unwrap().treatment_phases.as_ref().unwrap();
        let value = serde_json::to_value(phases).unwrap();
        assert_eq!(
            value["refractory"]["criteria"],
            "Switching from induction therapy within 60 days of therapy start"
        );
        assert_eq!(value["consolidation"]["criteria"].as_array().unwrap().len(), 2);
        assert!(value["second_relapse"].get("description").is_none());
    }

    #[test]
    fn test_llm_context_selects_sections() {
        let kb = KnowledgeBase::builtin();

        let context = kb.llm_context("Breast Cancer", "Which patient cohort is on each drug?");
        assert!(context.starts_with("Based on validated Patient Journey Rules for Breast Cancer:\n\n"));
        assert!(context.contains("Patient Funnel Rules:\nRule 1:"));
        assert!(context.contains("HER2+ Backbone Drugs: Trastuzumab (Herceptin + Biosimilars), Perjeta"));
        assert!(context.contains("\"HER2_backbone\": ["));
        assert!(!context.contains("Line of Therapy Progression Rules"));

        let context = kb.llm_context("AML", "How is the relapse phase defined?");
        assert!(context.contains("Treatment Phases:\n{\n  \"induction\""));
        assert!(!context.contains("Patient Funnel Rules"));
        assert!(!context.contains("AML Salvage Drugs:"));
    }

    #[test]
    fn test_llm_context_header_only_without_keywords() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(
            kb.llm_context("AML", "hello"),
            "Based on validated Patient Journey Rules for AML:\n\n"
        );
        assert_eq!(kb.llm_context("Migraine", "patient drug line"), "");
    }
}
