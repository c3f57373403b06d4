//! Built-in patient-journey rule tables.

use super::{
    Chemotherapy, Criteria, DrugClassifications, HormonalTherapy, IndicationKnowledge, OrderedMap,
    ProcessDefinition, SctConsiderations, TreatmentPhase,
};

fn strs(items: &[&'static str]) -> Vec<&'static str> {
    items.to_vec()
}

pub(super) fn her2_breast_cancer() -> IndicationKnowledge {
    IndicationKnowledge {
        key: "her2_breast_cancer",
        display_name: "HER2+ Breast Cancer",
        aliases: strs(&["breast_cancer", "her2_breast_cancer", "her2_positive_breast_cancer"]),
        patient_funnel_rules: strs(&[
            "Rule 1: Identify all Breast cancer patients based on ICD-9 and ICD-10 diagnosis codes",
            "Rule 2: Minimum Two Primary Diagnosis at least 15 days apart to filter out mis-diagnosed patients",
            "Rule 3: Min 1 year look back period to ensure entire journey capture from first diagnosis",
            "Rule 4: Quarterly eligibility for continuous data capture",
            "Rule 5: No treatment before diagnosis to ensure data from first diagnosis",
            "Rule 6: No metastatic claims before diagnosis",
            "Rule 7: HER2+ Patients identified based on utilization of backbone drugs",
        ]),
        backbone_drugs: Some(strs(&[
            "Trastuzumab (Herceptin + Biosimilars)",
            "Perjeta",
            "Kadcyla",
            "Tykerb",
            "Enhertu",
            "Nerlynx",
            "Phesgo",
            "Tukysa",
            "Margenza",
        ])),
        drug_classifications: Some(DrugClassifications {
            her2_backbone: strs(&[
                "TRASTUZUMAB",
                "PERJETA",
                "KADCYLA",
                "TYKERB",
                "ENHERTU",
                "NERLYNX",
                "PHESGO",
                "TUKYSA",
                "MARGENZA",
            ]),
            chemotherapy: Chemotherapy {
                platin_based: strs(&["CARBOPLATIN", "CISPLATIN", "OXALIPLATIN"]),
                taxane_based: strs(&["ABRAXANE", "PACLITAXEL", "ETOPOSIDE"]),
                other_chemos: strs(&[
                    "ETOPOSIDE",
                    "VINCRISTINE",
                    "CYCLOPHOSPHAMIDE",
                    "DOXORUBICIN",
                    "ELLENCE",
                    "GEMCITABINE",
                    "METHOTREXATE",
                    "XELODA",
                    "NAVELBINE",
                    "ADRUCIL",
                    "AFINITOR",
                    "VINBLASTINE",
                ]),
            },
            hormonal_therapy: HormonalTherapy {
                aromatase_inhibitors: strs(&[
                    "ANASTROZOLE",
                    "LETROZOLE",
                    "TAMOXIFEN",
                    "EXEMESTANE",
                    "FASLODEX",
                    "ZOLADEX",
                    "EVISTA",
                    "FARESTON",
                ]),
                cdk_inhibitors: strs(&["IBRANCE", "VERZENIO", "KISQALI"]),
            },
            targeted_other: strs(&[
                "HALAVEN",
                "AVASTIN",
                "WELLCOVORIN",
                "LEUCOVORIN",
                "LYNPARZA",
                "PIQRAY",
                "TRODELVY",
                "ZEJULA",
                "TALZENNA",
                "ZORTRESS",
                "RUBRACA",
            ]),
        }),
        lot_progression_rules: Some(strs(&[
            "Rule 1: Movement from one HER2+ drug to another indicates progression (Exception: Perjeta + Herceptin combination)",
            "Rule 2: Addition of lower priority drug to higher priority regimen is not line change",
            "Rule 3: Switch within Chemotherapy/targeted therapy is progression if previous regimen ≥90 days",
            "Rule 4: Movement from AI to CDK and vice versa is progression. Within AI/CDK is progression if gap ≥180 days",
            "Rule 5: Switch to HER2+ drug from other groups is progression if previous usage >90 days",
            "Rule 6: Switch to chemo indicates severity, progression if previous usage >90 days",
            "Rule 7: Targeted therapy usage is progression if previous usage >90 days",
            "Rule 8: Switch to AI mono regimens to prevent relapse is not progression",
            "Rule 9: Same regimen with gap <180 days is not progression",
        ])),
        episode_creation: Some(ProcessDefinition {
            definition: "Continuous usage of a drug where refills occur within Grace window",
            steps: Some(strs(&[
                "Filter for relevant treatments/drugs",
                "Check gap between next fill date and current rx end date",
                "If gap < grace period: continuation of current episode",
                "If gap > grace period: new episode",
            ])),
            method: None,
        }),
        regimen_creation: Some(ProcessDefinition {
            definition: "Combination of treatments undergone by patient in journey, derived from episodes",
            steps: None,
            method: Some("Derived from episode table with episode start/end dates for every drug"),
        }),
        treatment_phases: None,
        salvage_drugs: None,
        key_transitions: None,
        sct_considerations: None,
    }
}

pub(super) fn aml() -> IndicationKnowledge {
    IndicationKnowledge {
        key: "aml",
        display_name: "AML",
        aliases: strs(&["aml", "acute_myeloid_leukemia", "acute_myeloid_leukaemia"]),
        patient_funnel_rules: strs(&[
            "Rule 1: AML Diagnosed Patients - at least 1 AML Primary Diagnosis claim",
            "Rule 2: Minimum Two Primary Diagnosis at least 15 days apart OR 1 Diagnosis + 1 AML treatment post initiation",
            "Rule 3: Min 1 year look back period for entire journey capture",
            "Rule 5: No Remission or Relapse diagnosis before AML diagnosis",
            "Rule 6: At least 1 AML relevant treatment post Diagnosis to filter mis-diagnosed patients",
        ]),
        backbone_drugs: None,
        drug_classifications: None,
        lot_progression_rules: None,
        episode_creation: None,
        regimen_creation: None,
        treatment_phases: Some(OrderedMap(vec![
            (
                "induction",
                TreatmentPhase {
                    description: Some("Initial intensive treatment phase"),
                    criteria: None,
                    duration: Some("Typically ≥90 days"),
                    end_criteria: None,
                    next_phases: Some(strs(&["consolidation", "refractory", "maintenance"])),
                },
            ),
            (
                "consolidation",
                TreatmentPhase {
                    description: Some("Post-remission treatment to eliminate residual disease"),
                    criteria: Some(Criteria::Many(strs(&[
                        "Gap of >60 days from induction therapy end",
                        "Induction therapy duration ≥90 days",
                    ]))),
                    duration: Some("Expected ~6 cycles of 4 weeks (24 weeks total)"),
                    end_criteria: None,
                    next_phases: Some(strs(&["maintenance", "relapse"])),
                },
            ),
            (
                "maintenance",
                TreatmentPhase {
                    description: Some("Long-term treatment to prevent relapse"),
                    criteria: Some(Criteria::Many(strs(&[
                        "ONUREG treatment within 90 days post Consolidation end",
                        "OR 24 weeks (168 days) post Consolidation start",
                        "OR post 24 weeks post Remission Dx",
                    ]))),
                    duration: None,
                    end_criteria: Some("Ends at Relapse Dx"),
                    next_phases: Some(strs(&["relapse"])),
                },
            ),
            (
                "refractory",
                TreatmentPhase {
                    description: Some("Disease not responding to initial treatment"),
                    criteria: Some(Criteria::One(
                        "Switching from induction therapy within 60 days of therapy start",
                    )),
                    duration: None,
                    end_criteria: None,
                    next_phases: Some(strs(&["relapse", "sct"])),
                },
            ),
            (
                "relapse",
                TreatmentPhase {
                    description: Some("Disease recurrence after remission"),
                    criteria: Some(Criteria::Many(strs(&[
                        "Switching to Salvage Drugs",
                        "2 consecutive relapse Dx between 15-45 days apart",
                        "Single relapse Dx + Salvage drugs within -15 to +30 days",
                        "Gap >180 days post consolidation/maintenance/refractory therapy",
                    ]))),
                    duration: None,
                    end_criteria: None,
                    next_phases: Some(strs(&["second_relapse"])),
                },
            ),
            (
                "second_relapse",
                TreatmentPhase {
                    description: None,
                    criteria: Some(Criteria::Many(strs(&[
                        "Gap >90 days post relapse stage",
                        "Switching to new regimen post Relapse therapy",
                    ]))),
                    duration: None,
                    end_criteria: None,
                    next_phases: None,
                },
            ),
        ])),
        salvage_drugs: Some(strs(&[
            "Gilteritinib",
            "Sorafenib",
            "Fludarabine",
            "Enasidenib",
            "Ivosidenib",
            "Gemtuzumab Ozogamicin",
            "Midostaurin",
        ])),
        key_transitions: Some(OrderedMap(vec![
            ("induction_to_consolidation", "Gap >60 days + Induction ≥90 days"),
            ("consolidation_to_maintenance", "168 days (24 weeks) from consolidation start"),
            ("any_to_relapse", "Gap >180 days OR Salvage drugs OR 2 consecutive relapse Dx"),
            ("relapse_to_second_relapse", "Gap >90 days + new regimen"),
        ])),
        sct_considerations: Some(SctConsiderations {
            description: "Stem Cell Transplant",
            timing: "Can occur during consolidation or refractory phases",
            impact: "May influence line progression decisions",
        }),
    }
}
