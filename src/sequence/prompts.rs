//! System prompts for the drafting and rewrite calls.
//!
//! Only the structural contract matters downstream: the drafting model must
//! emit the six headed sections with `Subject:` lines, and every rewrite
//! must preserve headers, subjects and placeholders.

use super::SenderIdentity;

/// Drafting prompt: phrasing only, all structure comes from the user message.
pub fn writer_prompt(sender: &SenderIdentity) -> String {
    format!(
        "You write short, natural outreach emails on behalf of {name}.\n\
         Phrase the statements you are given clearly and conversationally.\n\
         Structure, sequencing and constraints are fixed by the outline you receive.\n\
         Do not invent facts, add ideas, or add framing sentences around a problem.\n\
         Write at an 8th-grade reading level with short sentences.\n\
         Sound like a peer scientist, not a vendor. Under-explain rather than over-explain.",
        name = sender.name
    )
}

/// Rewrite tying the pain in emails 1 and 2 to the prospect's own context.
pub const ANCHOR_PROMPT: &str = "Rewrite Email 1 and Email 2 so the pain maps clearly to the \
prospect's specific research context given below (disease, modality, or translational goal).\n\
If the pain could apply to any lab, anchor it to that context.\n\
Replace any indirect setup sentence (\"Something I hear a lot\", \"Many teams face\") with a \
direct statement addressed to the reader as \"you\".\n\
Do not add facts or increase specificity beyond what was given.\n\
Leave all other sections unchanged and output the full sequence with its headers.";

/// Voice compression rewrite in the sender's own register.
pub fn voice_prompt(sender: &SenderIdentity) -> String {
    format!(
        "Rewrite the text so it sounds like {name} wrote it. This is a voice pass only.\n\
         Prefer questions over statements. Speak to the reader's own work.\n\
         Use simple, direct language with no marketing language, metaphors or sales idioms.\n\
         Keep one concrete fact per email and drop stacked features and explanations.\n\
         Preserve meaning, structure, headers, subject lines, platform, context and placeholders.\n\
         Do not add information. Shorten sentences where possible.\n\
         Output only the rewritten text.",
        name = sender.name
    )
}

/// Targeted cleanup of detected violations.
pub const SUPPRESSION_PROMPT: &str = "Clean up the outreach text below. Fix only these problems \
and change nothing else:\n\
- forbidden phrases such as \"on your radar\", \"compare notes\", \"walk through\", \"show you\"\n\
- demo language: replace with plain verbs such as \"talk through\" or \"discuss\"\n\
- meeting durations such as \"30 minutes\" or \"quick call\": remove without substitute\n\
- competitor names: remove entirely\n\
- parentheses: remove them and fold any essential meaning into the sentence\n\
- third-party or setup framing (\"many teams\", \"a question that comes up\"): address the reader as \"you\"\n\
Preserve every section header, subject line, placeholder ({{first_name}}, {{availability}}) \
and platform name. Output only the cleaned text.";

/// Rewrite of email 4 with a different tone.
pub const REDUNDANCY_PROMPT: &str = "Rewrite the email below with a clearly different tone while \
keeping the same core message, call to action and formatting structure.\n\
Return only the rewritten email body, with no wrapper or explanation.";

/// Research brief request. The headings are parsed by the outline builder.
pub const RESEARCH_PROMPT: &str = "You research life-science labs and companies for spatial \
biology outreach. From the lead information, write a brief with exactly these headings, \
each followed by up to three short bullet points:\n\
Research focus and disease area\n\
Suggested Bruker instrument\n\
Likely pain / gap\n\
Recent trigger / pressure\n\
Concrete spatial advantage\n\
Under \"Suggested Bruker instrument\" include one line of the form \"Instrument: <name>\" where \
<name> is exactly one of CosMx, GeoMx or CellScape.\n\
Write bullets as plain statements about the prospect's own work. Cite recent publications, \
grants or announcements when you know them.";
