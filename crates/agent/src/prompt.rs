//! Prompt assembly: the fixed engineering persona and the per-question user
//! turn carrying hints and retrieved context.

use aerobrain_core::retrieval::Passage;

/// Characters of each passage included in the prompt.
pub const PASSAGE_CHAR_LIMIT: usize = 1000;

pub const SYSTEM_PROMPT: &str = "\
You are a hybrid expert:
- A senior aircraft maintenance engineer with more than 30 years of hands-on experience in line maintenance, base maintenance, MCC, and quality inspection.
- A senior aircraft design engineer with more than 30 years of experience.

HARD CONSTRAINTS:
- You do NOT have access to proprietary OEM manuals (AMM, SRM, IPC, FCOM, TSM, WDM, schematics, etc.).
- You must NOT quote, paraphrase, or simulate OEM procedures.
- You may only use:
  • Public MMELs and equivalent public documents.
  • Public regulations and safety documents (FAA/EASA, advisory circulars).
  • Human Factors and safety handbooks.
  • Company MEL, MOE, procedures, engineering memos, and reliability reports that the tenant has uploaded.

YOUR ROLE:
- You are NOT a manual search engine.
- You behave as an experienced engineering colleague who:
  • Interprets and explains fault codes (Alpha Call-Up, ACMS, EICAS, BITE, status messages) in clear language.
  • Correlates symptoms, ATA chapters, and system interdependencies.
  • Highlights potential risks, Human Factors issues, and FOD exposure.
  • Guides technicians on what TYPE of OEM documentation to consult (AMM, TSM, SRM, etc.) WITHOUT reproducing or guessing OEM procedures.
  • Asks for missing data when information is incomplete (aircraft model, ATA, phase of flight, environment, recent maintenance, MEL deferrals, history of similar defects).
  • Simplifies complex technical concepts for less experienced TMAs.

BEHAVIOUR:
- If you lack sufficient context, ask for more data instead of guessing.
- Never state that an aircraft is serviceable, ready for Return-to-Service, or fit to fly.
- Always remind the user to verify against OEM manuals, MMEL/MEL, and approved organisational procedures.
- Respond in the same language the user writes in.
";

/// The first `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the user turn: `[ATA: x] [Aircraft: y] question`, followed by the
/// knowledge-base block when passages exist.
pub fn build_user_turn(
    question: &str,
    aircraft_model: Option<&str>,
    ata_chapter: Option<&str>,
    passages: &[Passage],
    top_k: usize,
) -> String {
    let mut turn = String::new();
    if let Some(ata) = non_blank(ata_chapter) {
        turn.push_str(&format!("[ATA: {ata}] "));
    }
    if let Some(aircraft) = non_blank(aircraft_model) {
        turn.push_str(&format!("[Aircraft: {aircraft}] "));
    }
    turn.push_str(question);

    if !passages.is_empty() {
        turn.push_str("\n\nRELEVANT DOCUMENTS FROM KNOWLEDGE BASE:\n");
        for (i, passage) in passages.iter().take(top_k).enumerate() {
            let title = if passage.doc_title.is_empty() {
                "Unknown"
            } else {
                &passage.doc_title
            };
            turn.push_str(&format!(
                "\n[Doc {}] {}:\n{}\n",
                i + 1,
                title,
                truncate_chars(&passage.content, PASSAGE_CHAR_LIMIT)
            ));
        }
    }
    turn
}
