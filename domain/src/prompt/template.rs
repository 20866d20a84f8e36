//! Prompt templates for the consensus pipeline

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

fn push_sources(prompt: &mut String, sources: &[String]) {
    if sources.is_empty() {
        return;
    }
    prompt.push_str("\nReference sources:\n");
    for (i, source) in sources.iter().enumerate() {
        prompt.push_str(&format!("\n[Source {}]\n{}\n", i + 1, source));
    }
}

fn push_length_limit(prompt: &mut String, max_response_length: Option<usize>) {
    if let Some(limit) = max_response_length {
        prompt.push_str(&format!(
            "\nKeep your response under {} characters.\n",
            limit
        ));
    }
}

impl PromptTemplate {
    /// Shared Phase 1 prompt sent to every drafting model
    pub fn draft_prompt(
        topic: &str,
        sources: &[String],
        max_response_length: Option<usize>,
    ) -> String {
        let mut prompt = format!(
            r#"You are a knowledgeable expert writing an independent analysis.
Provide a thoughtful, well-reasoned, well-structured response on the following topic.
Support your points with reasoning and examples. Be accurate and clear.

Topic: {}
"#,
            topic
        );

        push_sources(&mut prompt, sources);
        if !sources.is_empty() {
            prompt.push_str("\nGround your analysis in the sources above where relevant and say when you go beyond them.\n");
        }
        push_length_limit(&mut prompt, max_response_length);

        prompt
    }

    /// Phase 2 prompt: `reviewer` critiques one other model's draft
    pub fn review_prompt(topic: &str, reviewed_name: &str, draft: &str) -> String {
        format!(
            r#"You are a critical reviewer evaluating another expert's analysis.
Be fair but thorough. Your critique will be used to build a final consensus answer.

Topic: {}

--- Analysis by {} ---
{}
--- End of analysis ---

Write your critique using exactly these sections:

## Summary
A brief summary of the analysis (2-3 sentences).

## Strengths
What the analysis gets right (bullet list).

## Weaknesses
Errors, gaps, or unsupported claims (bullet list).

## Suggestions
Concrete improvements (bullet list)."#,
            topic, reviewed_name, draft
        )
    }

    /// Phase 3 prompt: the arbiter receives everything that succeeded
    ///
    /// `drafts` are `(model name, content)`, `reviews` are
    /// `(reviewer name, reviewed name, content)`.
    pub fn arbitration_prompt(
        topic: &str,
        sources: &[String],
        drafts: &[(String, String)],
        reviews: &[(String, String, String)],
        max_response_length: Option<usize>,
    ) -> String {
        let mut prompt = format!(
            r#"You are the arbiter synthesizing several expert analyses and their peer reviews into one authoritative report.

Topic: {}
"#,
            topic
        );

        push_sources(&mut prompt, sources);

        prompt.push_str("\nExpert analyses:\n");
        for (model, content) in drafts {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", model, content));
        }

        if !reviews.is_empty() {
            prompt.push_str("\nPeer reviews:\n");
            for (reviewer, reviewed, content) in reviews {
                prompt.push_str(&format!(
                    "\n--- Review of {} by {} ---\n{}\n",
                    reviewed, reviewer, content
                ));
            }
        }

        prompt.push_str(
            r#"
Based on all analyses and reviews above, write the final report:

1. **Conclusion**: the synthesized answer, incorporating the strongest elements
2. **Key Points**: the most important points (bullet list)
3. **Consensus**: where the experts agreed (bullet list)
4. **Disagreements**: where they disagreed and which position is better supported (bullet list)

Format the report with clear markdown headers.
"#,
        );
        push_length_limit(&mut prompt, max_response_length);

        prompt
    }
}
