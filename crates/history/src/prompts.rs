//! Prompt templates for compaction and review.
//!
//! Replies must be JSON objects keyed by the field names in
//! [`crate::reply`]; the templates spell those keys out for the model.

use memoir_domain::message::Message;

const SUMMARY_TEMPLATE: &str = "\
请总结以下对话内容，生成简洁但信息丰富的摘要：

======以下为对话======
{transcript}
======以上为对话======

你的摘要应该保留关键信息、重要事实和主要讨论点，且不能具有误导性或产生歧义。

请以JSON格式返回结果，格式为 {\"对话摘要\": \"摘要内容\"}，不要输出任何其他内容。";

const DETAILED_SUMMARY_TEMPLATE: &str = "\
请总结以下对话内容，生成尽可能保留细节的摘要：

======以下为对话======
{transcript}
======以上为对话======

你的摘要应该尽可能多地保留具体细节，包括人名、地点、时间、数字、约定、偏好和情绪变化，
同时保持时间顺序，不能具有误导性或产生歧义。如果对话开头包含先前的备忘录，请将其内容合并进摘要。

请以JSON格式返回结果，格式为 {\"对话摘要\": \"摘要内容\"}，不要输出任何其他内容。";

const CONDENSE_TEMPLATE: &str = "\
以下是一段对话摘要，但它太长了。请在保留最关键信息的前提下进一步压缩，使其不超过500字：

======以下为摘要======
{summary}
======以上为摘要======

请以JSON格式返回结果，格式为 {\"对话摘要\": \"压缩后的摘要内容\"}，不要输出任何其他内容。";

const REVIEW_TEMPLATE: &str = "\
请审阅{human}和{ai}之间的对话历史记录，找出并修正以下问题：
1. 前后矛盾的信息
2. 冗余或重复的内容
3. 逻辑混乱的段落
4. {ai}机械复读的回答

======以下为对话历史======
{history}
======以上为对话历史======

请保持对话的原意和整体结构，只修正有问题的部分。开头的备忘录(system)请原样保留或仅做必要修正。

请以JSON格式返回结果，格式为：
{
    \"修正说明\": \"简要说明发现了哪些问题以及如何修正\",
    \"修正后的对话\": [
        {\"role\": \"{human}/{ai}/system\", \"content\": \"消息内容\"}
    ]
}
其中role只能是\"{human}\"、\"{ai}\"或\"system\"。不要输出任何其他内容。";

const MEMO_PREFIX: &str = "先前对话的备忘录: ";

/// Memo text stored when no summary could be produced.
pub const MEMO_PLACEHOLDER: &str = "先前对话的备忘录: 无。";

/// First-stage compaction prompt. `detailed` selects the
/// detail-preserving template.
pub fn compaction_prompt(transcript: &str, detailed: bool) -> String {
    let template = if detailed {
        DETAILED_SUMMARY_TEMPLATE
    } else {
        SUMMARY_TEMPLATE
    };
    template.replace("{transcript}", transcript)
}

/// Second-stage prompt. Carries only the oversized summary.
pub fn condense_prompt(summary: &str) -> String {
    CONDENSE_TEMPLATE.replace("{summary}", summary)
}

pub fn review_prompt(human: &str, ai: &str, history: &str) -> String {
    // Names first so text inside the history is never treated as a slot.
    REVIEW_TEMPLATE
        .replace("{human}", human)
        .replace("{ai}", ai)
        .replace("{history}", history)
}

/// Wrap a summary as the synthetic system memo that heads the history.
pub fn memo_message(summary: &str) -> Message {
    Message::system(format!("{MEMO_PREFIX}{summary}"))
}

pub fn placeholder_memo() -> Message {
    Message::system(MEMO_PLACEHOLDER)
}
