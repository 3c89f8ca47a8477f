//! Domain gate: cheap keyword heuristics deciding whether a question belongs
//! to aviation maintenance at all.

/// Airframe tokens recognised in the aircraft-model field.
pub const AIRFRAME_TOKENS: [&str; 14] = [
    "a318", "a319", "a320", "a321", "a330", "a340", "a350", "a380", "b737", "b747", "b757",
    "b767", "b777", "b787",
];

/// Keywords that place a free-text question in the aviation domain.
pub const AVIATION_KEYWORDS: [&str; 31] = [
    "aircraft",
    "engine",
    "apu",
    "cfm",
    "v2500",
    "trent",
    "boeing",
    "airbus",
    "embraer",
    "ata",
    "amm",
    "mmel",
    "mro",
    "eicas",
    "ecam",
    "bite",
    "hydraulic",
    "flap",
    "slat",
    "spoiler",
    "brake",
    "landing gear",
    "lgciu",
    "fdr",
    "cvr",
    "bleed",
    "pack",
    "fuel pump",
    "generator",
    "idg",
    "starter",
];

/// Markers of a fault-centric question (crew alerting, central maintenance
/// messages, BITE results).
pub const FAULT_KEYWORDS: [&str; 13] = [
    "alpha call-up",
    "alpha call up",
    "acms",
    "acars",
    "eicas",
    "ecam",
    "bite",
    "fault code",
    "status message",
    "maintenance message",
    "advisory",
    "caution",
    "warning",
];

/// Classify a question. First matching rule wins:
/// airframe token in `aircraft_model`, non-blank `ata`, aviation keyword in
/// the question.
pub fn is_in_domain(question: &str, aircraft_model: Option<&str>, ata: Option<&str>) -> bool {
    if let Some(model) = aircraft_model {
        let model = model.to_lowercase();
        if AIRFRAME_TOKENS.iter().any(|t| model.contains(t)) {
            return true;
        }
    }

    if ata.is_some_and(|a| !a.trim().is_empty()) {
        return true;
    }

    let question = question.to_lowercase();
    AVIATION_KEYWORDS.iter().any(|k| question.contains(k))
}

pub fn contains_fault_indicators(text: &str) -> bool {
    let text = text.to_lowercase();
    FAULT_KEYWORDS.iter().any(|k| text.contains(k))
}
