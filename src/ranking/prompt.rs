//! Prompt text for chat-completion rankers.

use super::RankRequest;

/// Build the ranking prompt for one request.
pub fn build_prompt(request: &RankRequest<'_>, knowledge_base: &str) -> String {
    let candidates = serde_json::to_string_pretty(request.candidates)
        .unwrap_or_else(|_| request.candidates.join("\n"));

    let mut prompt = String::new();
    prompt.push_str("You are a code analysis assistant.\n");
    prompt.push_str(
        "Using the knowledge base below, decide which exported function a JavaScript call refers to.\n\n",
    );

    if !knowledge_base.trim().is_empty() {
        prompt.push_str(knowledge_base.trim_end());
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("**API call:**\n`{}`\n\n", request.api));
    prompt.push_str(&format!(
        "**Import type:**\n`{}`\n\n",
        request.import_type.unwrap_or("unknown")
    ));
    prompt.push_str(&format!("**Candidate functions:**\n```json\n{}\n```\n\n", candidates));

    if let Some(config) = request.package_config {
        prompt.push_str("**package.json of the called package:**\n");
        prompt.push_str("Use it to work out how the package's entry points resolve.\n");
        prompt.push_str(&format!("```json\n{}\n```\n\n", config.trim_end()));
    }

    prompt.push_str("**Requirements:**\n");
    prompt.push_str(
        "1. Follow the knowledge base, especially its rules for `exports`, `import`, `require` and build targets.\n",
    );
    prompt.push_str("2. Use the call and the candidate paths to pick the best match.\n");
    prompt.push_str("3. Output only function signatures, one per line, copied exactly from the candidates.\n");
    prompt.push_str("4. Do not quote the signatures and do not add any explanation.\n");

    prompt
}
