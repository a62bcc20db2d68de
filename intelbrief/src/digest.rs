use tracing::{error, info};

use crate::item::{truncate_chars, NewsItem};
use crate::llm::{LlmProvider, LlmRequest};

/// Returned without a model call when there is nothing to summarize.
pub const NO_NEWS_MESSAGE: &str = "No significant news found today.";

/// Per-item content cap inside the combined prompt, to bound token usage.
pub const PROMPT_CONTENT_CHARS: usize = 3_000;

/// Default system instruction. The model is trusted to follow the section
/// schema; the returned text is published verbatim.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"
You are 'VibeCoder', an elite deep-tech analyst.
You write **Technical Recaps** for engineers and VCs.

**INPUT DATA:** You will be provided with FULL ARTICLES found via search.
**TASK:** Synthesize this into a high-density update.

**STRICT RULES:**
1.  **No Hallucinations:** Use ONLY the provided text.
2.  **Citations:** You MUST cite the **Source URL** provided in the input data.
    * If the input says "Source: [URL]", use THAT link.
    * Do NOT cite an aggregator if the text actually came from the original outlet.

**OUTPUT FORMAT:**

### ⚡ AI Twitter Recap & Dev Tooling
* **[Tool/Model Name]**: [One sentence summary].
    * *Details:* [Technical specs: Pricing, Context Window, Features].
    * *Signal:* [Why this matters].
    * *Source:* [Link to source]

### 💰 Deal Flow (India)
* **[Startup Name]**: [Amount Raised] - [Sector].
    * *Investors:* [Lead Investor], [Others].
    * *Context:* [What they do].
    * *Source:* [Link to source]

### 🛡️ Defense & Deep Tech
* **[Project/Startup]**: [Contract Details/Innovation].
    * *Source:* [Link to source]

### 🐦 Social Signal
* **[Person Name]**: [Their take/tweet summary]. (Source: Google News)
"#;

/// Concatenate per-item blocks into the raw-data half of the prompt.
pub fn build_data_block(items: &[NewsItem]) -> String {
    let mut block = String::new();
    for item in items {
        let content_preview = if item.content.is_empty() {
            "No content.".to_string()
        } else {
            truncate_chars(&item.content, PROMPT_CONTENT_CHARS)
        };
        block.push_str(&format!("--- SOURCE: {} ---\n", item.source));
        block.push_str(&format!("LINK: {}\n", item.url));
        block.push_str(&format!("CONTENT: {}\n\n", content_preview));
    }
    block
}

/// Submit the collected items as one combined prompt and return the model's
/// digest text verbatim. Model failures are surfaced as a literal error
/// string inside the would-be digest rather than aborting the run.
pub async fn generate_digest(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    items: &[NewsItem],
) -> String {
    if items.is_empty() {
        return NO_NEWS_MESSAGE.to_string();
    }

    let data_block = build_data_block(items);
    let prompt = format!("{}\n\nRAW DATA TO PROCESS:\n{}", system_prompt, data_block);

    info!(items = items.len(), "asking model for digest");
    match provider
        .generate(LlmRequest {
            prompt,
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        })
        .await
    {
        Ok(response) => {
            info!(
                model = %response.model,
                prompt_tokens = response.usage.prompt_tokens,
                completion_tokens = response.usage.completion_tokens,
                "digest generated"
            );
            response.content
        }
        Err(e) => {
            error!(error = %e, "digest generation failed");
            format!("Error generating digest. AI Error: {}", e)
        }
    }
}
