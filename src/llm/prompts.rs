use crate::models::TicketDraft;

/// System prompt for detail generation
pub const SYSTEM_PROMPT: &str = r#"You are expanding a drafted work item from a meeting into a complete ticket. You MUST follow these rules:

1. Stay faithful to the draft and the supporting quotes; do not invent requirements that contradict them.
2. Keep the draft's priority unless the evidence clearly demands otherwise.
3. Write acceptance criteria as independently verifiable statements.
4. Keep every supporting quote you rely on in the quotes array, verbatim.
5. Output MUST be submitted through the submit_detail tool, matching its schema exactly.

The problem statement should say what is wrong for the user, not what the fix is. The description may propose an approach."#;

/// Build the user prompt for one ticket draft
pub fn build_detail_prompt(
    draft: &TicketDraft,
    problem_context: &str,
    solution_context: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Draft: {}\n", draft.title));
    prompt.push_str(&format!("Priority: {}\n\n", draft.priority.as_str()));

    if let Some(description) = &draft.description {
        prompt.push_str("## Draft Description\n");
        prompt.push_str(description);
        prompt.push_str("\n\n");
    }

    if let Some(criteria) = &draft.acceptance_criteria {
        prompt.push_str("## Draft Acceptance Criteria\n");
        for criterion in criteria {
            prompt.push_str(&format!("- {criterion}\n"));
        }
        prompt.push('\n');
    }

    if !draft.source_quotes.is_empty() {
        prompt.push_str("## Supporting Quotes\n");
        for quote in &draft.source_quotes {
            if quote.speaker.is_empty() {
                prompt.push_str(&format!("- \"{}\"\n", quote.text));
            } else {
                prompt.push_str(&format!("- {}: \"{}\"\n", quote.speaker, quote.text));
            }
        }
        prompt.push('\n');
    }

    if !problem_context.trim().is_empty() {
        prompt.push_str("## Problem Context\n");
        prompt.push_str(problem_context.trim());
        prompt.push_str("\n\n");
    }

    if !solution_context.trim().is_empty() {
        prompt.push_str("## Solution Context\n");
        prompt.push_str(solution_context.trim());
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Instructions\n");
    prompt.push_str(
        "Expand this draft into a complete ticket and submit it with the submit_detail tool.\n",
    );
    prompt.push_str("Ground every acceptance criterion in the draft or the quotes.\n");

    prompt
}
