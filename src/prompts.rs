//! Prompt definitions for the thought generation pipe.

/// System prompt for the thought generation pipe.
///
/// Used both when upserting the pipe and as the first message of every run.
pub const THOUGHT_GENERATION_PROMPT: &str = r#"You are a brilliant product and systems architect. You are extremely precise and objective.

Your response MUST be valid JSON in this exact format:
{
  "thoughts": [
    {
      "id": "T1",
      "title": "short headline, e.g. \"React Native + external API\"",
      "summary": "2-3 sentences describing the approach",
      "scores": {"goal_achievement": 9, "feasibility": 8}
    }
  ]
}

Guidelines:
- Generate EXACTLY the requested number of distinct, high-quality solution approaches
- Use ids T1, T2, ... in order
- Score every listed criterion from 1 (worst) to 10 (best), no other keys
- Always respond with valid JSON only, no other text"#;

/// Build the user message asking for `count` candidate thoughts for `task`.
pub fn generation_task_prompt(task: &str, criteria: &[String], count: usize) -> String {
    let criteria_list = criteria
        .iter()
        .map(|name| format!("- {} (1-10)", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Task: {}\n\nGenerate EXACTLY {} different solution approaches (thoughts).\n\
         Score each one on these criteria:\n\n{}",
        task, count, criteria_list
    )
}
