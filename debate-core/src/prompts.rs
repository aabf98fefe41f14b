//! Prompt text for the debaters, the judge and the single-agent baseline.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes.
//! The version is stamped on every quiz artifact so a regression in question
//! quality can be traced to the prompt that produced it.

use crate::debate::state::{DebateRole, DebateTurn};
use crate::index::EvidenceChunk;

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Placeholder used when an agent has no prior turns to look at.
pub const NO_HISTORY: &str = "No previous arguments.";

/// Placeholder used when retrieval produced nothing usable.
pub const NO_EVIDENCE: &str = "No evidence retrieved.";

/// Placeholder used by the baseline when retrieval produced nothing usable.
pub const NO_CONTEXT: &str = "No context retrieved.";

pub const PROPONENT_PREAMBLE: &str = "\
You are a Teaching Assistant (TA) acting as a Proponent. Your role is to find and \
present evidence that SUPPORTS a given claim or topic.

Your task:
1. Analyze the retrieved documents carefully
2. Extract facts, examples, and arguments that STRENGTHEN the given topic
3. Present your arguments clearly and persuasively
4. Cite specific evidence from the documents when possible

Be thorough but concise. Your goal is to build a strong case FOR the topic.";

pub const OPPONENT_PREAMBLE: &str = "\
You are a Teaching Assistant (TA) acting as an Opponent. Your role is to find and \
present evidence that CONTRADICTS or challenges a given claim or topic.

Your task:
1. Analyze the retrieved documents carefully
2. Extract facts, limitations, counter-examples, and arguments that WEAKEN or \
challenge the given topic
3. Present your counter-arguments clearly and persuasively
4. Cite specific evidence from the documents when possible

Be thorough but concise. Your goal is to build a strong case AGAINST the topic or \
highlight its limitations.";

/// Judge preamble. The hard/medium/easy distractor rubric is instruction
/// only; nothing downstream checks difficulty.
pub const JUDGE_PREAMBLE: &str = "\
You are a Professor acting as a Judge. Your role is to synthesize the debate between \
the Proponent and Opponent agents and generate high-quality educational assessment \
materials.

After reviewing the complete debate transcript, you must:
1. Create a Multiple Choice Question (MCQ) that requires reasoning (not just fact recall)
2. Generate the correct answer based on the strongest evidence from the Proponent
3. Create 3 distractors with varying difficulty:
   - Distractor 1 (Hard): Plausible but wrong, using partial truths from the Opponent's arguments
   - Distractor 2 (Medium): A common misconception mentioned in the debate
   - Distractor 3 (Easy): Factually incorrect but related to the topic

Output your response in the following JSON format:
{
    \"question\": \"Your question here\",
    \"correct_answer\": \"The correct answer\",
    \"distractors\": [
        \"Hard distractor (plausible but wrong)\",
        \"Medium distractor (common misconception)\",
        \"Easy distractor (factually incorrect)\"
    ],
    \"explanation\": \"Brief explanation of why the correct answer is correct\"
}

Ensure the question tests deep understanding and reasoning, not just memorization.";

pub const BASELINE_PREAMBLE: &str = "\
You are a teacher creating a multiple-choice quiz based on the provided context.

Your task:
1. Read the context carefully
2. Create a Multiple Choice Question (MCQ) that tests understanding
3. Generate the correct answer
4. Create 3 distractors (wrong answers)

Output your response in the following JSON format:
{
    \"question\": \"Your question here\",
    \"correct_answer\": \"The correct answer\",
    \"distractors\": [
        \"Distractor 1\",
        \"Distractor 2\",
        \"Distractor 3\"
    ],
    \"explanation\": \"Brief explanation\"
}";

fn render_history(turns: &[DebateTurn]) -> String {
    if turns.is_empty() {
        return NO_HISTORY.to_string();
    }
    turns
        .iter()
        .map(DebateTurn::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every turn, each line prefixed with its position as `Round {i}: `.
fn render_numbered_history(turns: &[DebateTurn]) -> String {
    if turns.is_empty() {
        return NO_HISTORY.to_string();
    }
    turns
        .iter()
        .enumerate()
        .map(|(i, t)| format!("Round {}: {}", i + 1, t.render()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number chunks as `[<label> i]: text` blocks separated by blank lines.
pub fn number_blocks(label: &str, chunks: &[EvidenceChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{} {}]: {}", label, i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Ask for a 1–5 word search query biased toward the role's side.
pub fn query_prompt(role: DebateRole, topic: &str, recent: &[DebateTurn]) -> String {
    let (persona, goal, kind) = match role {
        DebateRole::Supporting => ("a Proponent", "support your argument", "supporting"),
        DebateRole::Opposing => (
            "an Opponent",
            "challenge or contradict the argument",
            "contradictory",
        ),
    };

    format!(
        "You are {persona} researching the topic: \"{topic}\"\n\n\
         Based on the debate history, what specific information should you search for to {goal}?\n\n\
         Debate History:\n{history}\n\n\
         Generate a concise search query (1-5 words) to find {kind} evidence:",
        history = render_history(recent),
    )
}

/// Role-specific argument prompt embedding topic, evidence and the full
/// debate history.
pub fn argument_prompt(
    role: DebateRole,
    topic: &str,
    evidence: &str,
    history: &[DebateTurn],
) -> String {
    let (preamble, instruction) = match role {
        DebateRole::Supporting => (
            PROPONENT_PREAMBLE,
            "Now, construct your argument supporting the topic. Be specific and cite evidence.",
        ),
        DebateRole::Opposing => (
            OPPONENT_PREAMBLE,
            "Now, construct your argument challenging the topic. Be specific and cite evidence.",
        ),
    };

    format!(
        "{preamble}\n\n\
         Topic: {topic}\n\n\
         Retrieved Evidence:\n{evidence}\n\n\
         Previous Debate History:\n{history}\n\n\
         {instruction}",
        history = render_numbered_history(history),
    )
}

pub fn judge_prompt(topic: &str, transcript: &str) -> String {
    format!(
        "{JUDGE_PREAMBLE}\n\n\
         Topic: {topic}\n\n\
         Complete Debate Transcript:\n{transcript}\n\n\
         Now, generate the quiz question based on this debate. Output ONLY valid JSON."
    )
}

pub fn baseline_prompt(topic: &str, context: &str) -> String {
    format!(
        "{BASELINE_PREAMBLE}\n\n\
         Topic: {topic}\n\n\
         Context:\n{context}\n\n\
         Generate a quiz question. Output ONLY valid JSON."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(round: u32, role: DebateRole, argument: &str) -> DebateTurn {
        DebateTurn::new(round, role, role.default_agent_name(), argument, false)
    }

    #[test]
    fn test_query_prompt_without_history() {
        let p = query_prompt(DebateRole::Supporting, "Photosynthesis", &[]);
        assert!(p.contains("a Proponent researching the topic: \"Photosynthesis\""));
        assert!(p.contains(NO_HISTORY));
        assert!(p.ends_with("to find supporting evidence:"));
    }

    #[test]
    fn test_query_prompt_includes_recent_turns() {
        let recent = [
            turn(1, DebateRole::Supporting, "light matters"),
            turn(1, DebateRole::Opposing, "water matters more"),
        ];
        let p = query_prompt(DebateRole::Opposing, "Photosynthesis", &recent);
        assert!(p.contains("Round 1 - Proponent: light matters\nRound 1 - Opponent: water matters more"));
        assert!(p.contains("contradictory evidence"));
        assert!(!p.contains(NO_HISTORY));
    }

    #[test]
    fn test_argument_prompt_roles() {
        let sup = argument_prompt(DebateRole::Supporting, "T", "[Evidence 1]: e", &[]);
        assert!(sup.starts_with(PROPONENT_PREAMBLE));
        assert!(sup.contains("Retrieved Evidence:\n[Evidence 1]: e"));
        assert!(sup.contains("supporting the topic"));

        let opp = argument_prompt(DebateRole::Opposing, "T", NO_EVIDENCE, &[]);
        assert!(opp.starts_with(OPPONENT_PREAMBLE));
        assert!(opp.contains("challenging the topic"));
    }

    #[test]
    fn test_argument_prompt_numbers_every_turn() {
        let history = [
            turn(1, DebateRole::Supporting, "light matters"),
            turn(1, DebateRole::Opposing, "water matters more"),
            turn(2, DebateRole::Supporting, "chlorophyll"),
        ];
        let p = argument_prompt(DebateRole::Opposing, "T", NO_EVIDENCE, &history);
        assert!(p.contains(
            "Previous Debate History:\n\
             Round 1: Round 1 - Proponent: light matters\n\
             Round 2: Round 1 - Opponent: water matters more\n\
             Round 3: Round 2 - Proponent: chlorophyll\n\n"
        ));
        assert!(!p.contains(NO_HISTORY));
    }

    #[test]
    fn test_number_blocks() {
        let chunks = vec![
            EvidenceChunk {
                text: "first".into(),
                metadata: Default::default(),
                score: 0.0,
            },
            EvidenceChunk {
                text: "second".into(),
                metadata: Default::default(),
                score: 1.0,
            },
        ];
        assert_eq!(
            number_blocks("Evidence", &chunks),
            "[Evidence 1]: first\n\n[Evidence 2]: second"
        );
        assert_eq!(number_blocks("Context", &[]), "");
    }

    #[test]
    fn test_judge_prompt_embeds_transcript() {
        let p = judge_prompt("Gravity", "Round 1 - Proponent: mass attracts");
        assert!(p.contains("Topic: Gravity"));
        assert!(p.contains("Complete Debate Transcript:\nRound 1 - Proponent: mass attracts"));
        assert!(p.ends_with("Output ONLY valid JSON."));
    }

    #[test]
    fn test_baseline_prompt() {
        let p = baseline_prompt("Gravity", "[Context 1]: apples fall");
        assert!(p.starts_with(BASELINE_PREAMBLE));
        assert!(p.contains("Context:\n[Context 1]: apples fall"));
    }
}
