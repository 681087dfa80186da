//! Prompt text for the generation and guardrail calls

use crate::artifact::GeneratedArtifact;
use crate::diagnostics::Diagnostic;
use crate::reference::ReferenceDocs;

/// Marker used in the human turn when a check found nothing
pub const NONE_MARKER: &str = "None";

const GENERATION_TEMPLATE: &str = r#"You are <Agent K>, a trading agent launcher for the Kadena blockchain.

Your task is to write the JavaScript that executes one step of a user's trading strategy, plus the code that decides when that step runs.

You will be given a prompt describing the strategy. Every function you need is predefined; you only write the code that uses them.

Resources:
1. Function catalogue:
{capabilities}
   These functions are predefined. Call them; never redefine them.
2. Usage examples:
{usage}
3. Token registry:
{tokens}
   Validate every token the user names against this registry and use its module name.
4. Predefined variables:
{predefined}
{history}
When a prompt arrives:
1. Work out which tokens, amounts and conditions the strategy needs.
2. Plan the steps of a single execution.
3. Write the code for those steps inside the region marked in the baseline function. Do not change anything outside the marked region.
4. Write the interval code that calls baselineFunction() at the right times.

Rules:
- The user is not involved in execution, so the code must run unattended.
- Hardcode every parameter the prompt fixes.
- Implement one execution only; repetition belongs in the interval.
- Await every predefined async function.
- Keep the code simple and drop comments that do not explain anything.

BASELINE FUNCTION:
{baseline}

Output format:
Return JSON with only these keys, no markdown:
{
  "code": "<the complete baselineFunction()>",
  "interval": "<JavaScript that schedules baselineFunction(), e.g. a setInterval loop>"
}
"#;

const HISTORY_TEMPLATE: &str = "
Previous dialogue:
{dialogue}
";

/// System instruction for the guardrail repair call
pub const REPAIR_SYSTEM_PROMPT: &str = r#"You review and correct JavaScript snippets produced for a trading agent.

You receive:
  - code: the complete async function baselineFunction()
  - interval: the code that schedules baselineFunction()
  - syntax errors reported by a parser, or None
  - lint warnings reported by shallow pattern checks, or None

Make sure the code and its logic are free of mistakes, and correct any you find.
Change nothing that is already correct.
Ignore undefined-reference problems: those functions and variables are provided by the runtime.
Lint warnings are heuristics. Fix one only if it would actually break the strategy.

If nothing needs fixing, return the code and interval exactly as given.

Output valid JSON with only the `code` and `interval` keys.
No markdown, no commentary, no extra keys.

{
  "code": "<corrected baselineFunction()>",
  "interval": "<corrected scheduling code>"
}
"#;

/// Substitute `{name}` placeholders in one pass, so inserted text is never
/// re-scanned for placeholders
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let hit = values.iter().find(|(name, _)| {
            after
                .strip_prefix(name)
                .is_some_and(|tail| tail.starts_with('}'))
        });

        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Build the generation system instruction from the reference docs and an
/// optional rendered dialogue
pub fn generation_system_prompt(docs: &ReferenceDocs, dialogue: Option<&str>) -> String {
    let history = match dialogue {
        Some(dialogue) => fill(HISTORY_TEMPLATE, &[("dialogue", dialogue)]),
        None => String::new(),
    };

    fill(
        GENERATION_TEMPLATE,
        &[
            ("capabilities", docs.capabilities.as_str()),
            ("usage", docs.usage.as_str()),
            ("tokens", docs.tokens.as_str()),
            ("predefined", docs.predefined.as_str()),
            ("history", history.as_str()),
            ("baseline", docs.baseline.as_str()),
        ],
    )
}

/// Human turn for the guardrail call
pub fn repair_user_prompt(
    artifact: &GeneratedArtifact,
    syntax: Option<&Diagnostic>,
    lint: &[Diagnostic],
) -> String {
    let syntax_text = syntax
        .map(|d| d.to_string())
        .unwrap_or_else(|| NONE_MARKER.to_string());
    let lint_text = if lint.is_empty() {
        NONE_MARKER.to_string()
    } else {
        lint.iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Here is the code:\n```js\n{}\n```\nHere is the interval:\n```js\n{}\n```\n\nSyntax errors: {}\nLint errors: {}\n",
        artifact.code, artifact.interval, syntax_text, lint_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactField;
    use crate::diagnostics::LintRule;

    fn docs() -> ReferenceDocs {
        ReferenceDocs {
            capabilities: "CAPS".into(),
            usage: "USAGE".into(),
            tokens: "TOKENS".into(),
            predefined: "VARS".into(),
            baseline: "BASE {usage}".into(),
        }
    }

    #[test]
    fn test_fill_replaces_known_placeholders_only() {
        let out = fill("a {x} b {y} {\"k\": 1}", &[("x", "1"), ("y", "2")]);
        assert_eq!(out, "a 1 b 2 {\"k\": 1}");
    }

    #[test]
    fn test_fill_does_not_rescan_inserted_text() {
        let out = fill("{x}", &[("x", "{y}"), ("y", "boom")]);
        assert_eq!(out, "{y}");
    }

    #[test]
    fn test_generation_prompt_embeds_docs() {
        let prompt = generation_system_prompt(&docs(), None);
        for needle in ["CAPS", "USAGE", "TOKENS", "VARS", "BASE {usage}"] {
            assert!(prompt.contains(needle), "missing {}", needle);
        }
        assert!(!prompt.contains("Previous dialogue"));
        assert!(prompt.contains("\"code\""));
        assert!(!prompt.contains("{capabilities}"));
    }

    #[test]
    fn test_generation_prompt_with_history() {
        let prompt = generation_system_prompt(&docs(), Some("Human: hi\nAI: hello"));
        assert!(prompt.contains("Previous dialogue:\nHuman: hi\nAI: hello"));
    }

    #[test]
    fn test_repair_prompt_without_diagnostics() {
        let artifact = GeneratedArtifact::new("c()", "i()");
        let prompt = repair_user_prompt(&artifact, None, &[]);
        assert_eq!(
            prompt,
            "Here is the code:\n```js\nc()\n```\nHere is the interval:\n```js\ni()\n```\n\nSyntax errors: None\nLint errors: None\n"
        );
    }

    #[test]
    fn test_repair_prompt_lists_diagnostics() {
        let artifact = GeneratedArtifact::new("c()", "i()");
        let syntax = Diagnostic::syntax("Line 1:3: Missing ')'").in_field(ArtifactField::Code);
        let lint = vec![
            Diagnostic::lint(LintRule::ConstReassignment, "Cannot reassign const `x`")
                .in_field(ArtifactField::Code),
            Diagnostic::lint(LintRule::MissingAwait, "Missing `await` for `f()` call")
                .in_field(ArtifactField::Interval),
        ];

        let prompt = repair_user_prompt(&artifact, Some(&syntax), &lint);
        assert!(prompt.contains("Syntax errors: [code] Line 1:3: Missing ')'\n"));
        assert!(prompt.contains(
            "Lint errors: [code] Cannot reassign const `x`\n[interval] Missing `await` for `f()` call\n"
        ));
    }
}
