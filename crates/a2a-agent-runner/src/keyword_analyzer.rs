//! Offline stand-in for the language model behind the intent analyst.
//!
//! Matches a fixed keyword table so the runner works without credentials.

use a2a_rt_agent::agents::IntentAnalyzer;
use a2a_rt_protocol::payloads::AnalyzeIntentRequest;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

struct Rule {
    keywords: &'static [&'static str],
    tag: &'static str,
    product_type: Option<&'static str>,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["work from home", "remote", "office", "video call"],
        tag: "work_from_home",
        product_type: Some("broadband"),
    },
    Rule {
        keywords: &["gaming", "game", "latency", "ping"],
        tag: "gaming",
        product_type: Some("broadband"),
    },
    Rule {
        keywords: &["stream", "netflix", "movie", "tv", "sport"],
        tag: "entertainment",
        product_type: Some("tv"),
    },
    Rule {
        keywords: &["phone", "mobile", "sim", "data plan"],
        tag: "mobile",
        product_type: Some("mobile"),
    },
    Rule {
        keywords: &["kids", "family", "household"],
        tag: "family",
        product_type: None,
    },
    Rule {
        keywords: &["alarm", "camera", "security"],
        tag: "home_security",
        product_type: Some("security"),
    },
    Rule {
        keywords: &["business", "company", "employees"],
        tag: "business",
        product_type: None,
    },
    Rule {
        keywords: &["broadband", "internet", "fiber", "fibre", "wifi"],
        tag: "connectivity",
        product_type: Some("broadband"),
    },
];

const POSITIVE: &[&str] = &["love", "great", "happy", "excited", "thanks"];
const NEGATIVE: &[&str] = &["slow", "terrible", "angry", "cancel", "frustrated", "broken"];

static RULE_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| RULES.iter().map(|rule| word_pattern(rule.keywords)).collect());
static POSITIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| word_pattern(POSITIVE));
static NEGATIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| word_pattern(NEGATIVE));

/// Whole-word match of any of `words`, allowing a plural `s`.
fn word_pattern(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|word| regex::escape(word)).collect();
    Regex::new(&format!(r"\b(?:{})s?\b", alternatives.join("|"))).expect("Valid regex pattern")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    fn classify(&self, text: &str) -> Value {
        let lowered = text.to_lowercase();
        let mut tags: Vec<&str> = Vec::new();
        let mut product_types: Vec<&str> = Vec::new();
        let mut entities = Vec::new();

        for (rule, pattern) in RULES.iter().zip(RULE_PATTERNS.iter()) {
            let Some(keyword) = pattern.find(&lowered).map(|found| found.as_str()) else {
                continue;
            };
            if !tags.contains(&rule.tag) {
                tags.push(rule.tag);
            }
            if let Some(product) = rule.product_type
                && !product_types.contains(&product)
            {
                product_types.push(product);
            }
            entities.push(json!({ "type": "keyword", "value": keyword, "confidence": 0.8 }));
        }

        let positive = POSITIVE_PATTERN.find_iter(&lowered).count();
        let negative = NEGATIVE_PATTERN.find_iter(&lowered).count();
        let sentiment = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => "positive",
            std::cmp::Ordering::Less => "negative",
            std::cmp::Ordering::Equal => "neutral",
        };

        let confidence = match tags.len() {
            0 => 0.3,
            1 => 0.7,
            _ => 0.85,
        };
        let reasoning = if tags.is_empty() {
            "No known keywords found".to_string()
        } else {
            format!("Matched keywords for {}", tags.join(", "))
        };

        json!({
            "tags": tags,
            "entities": entities,
            "productTypes": product_types,
            "sentiment": sentiment,
            "confidence": confidence,
            "reasoning": reasoning,
        })
    }
}

#[async_trait]
impl IntentAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, request: &AnalyzeIntentRequest) -> anyhow::Result<Value> {
        let mut text = request.text.clone();
        if let Some(previous) = &request.previous_intents {
            for intent in previous {
                text.push(' ');
                text.push_str(intent);
            }
        }
        Ok(self.classify(&text))
    }

    async fn merge(&self, intents: &[String]) -> anyhow::Result<Value> {
        Ok(self.classify(&intents.join("\n")))
    }
}
