//! Higher-level read operations built on [`KnowledgeStore`]: question
//! answering over stored context and the derived views used for browsing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

use crate::config::ANSWER_TOP_K;
use crate::error::Result;
use crate::store::{KnowledgeStore, Profile, Record, ScoredRecord};

pub const NO_INFORMATION: &str = "I don't have enough information to answer this question.";
pub const NO_ANSWER: &str = "No answer found.";

/// Above this many words only the best hit is used as context
const MAX_CONTEXT_WORDS: usize = 500;
/// Question and sentence must share more than this many words
const MIN_WORD_OVERLAP: usize = 1;
const PREVIEW_CHARS: usize = 100;
/// Group for topics without a `Prefix:` part
pub const GENERAL_GROUP: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: String,
    pub source: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub id: usize,
    pub date: String,
    pub topic: String,
    pub source: String,
    pub preview: String,
}

/// Search hits sharing one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub topic: String,
    pub hits: Vec<ScoredRecord>,
}

pub struct RetrievalFacade<'a> {
    store: &'a mut KnowledgeStore,
}

impl<'a> RetrievalFacade<'a> {
    pub fn new(store: &'a mut KnowledgeStore) -> Self {
        Self { store }
    }

    /// Answer `question` from the closest stored content
    pub fn answer(&mut self, question: &str, profile: &Profile) -> Result<Answer> {
        let hits = self.store.search(question, ANSWER_TOP_K, profile)?;
        Ok(extract_answer(question, &hits))
    }

    pub fn topics(&mut self, profile: &Profile) -> Result<BTreeSet<String>> {
        self.store.list_topics(profile)
    }

    /// Number of records per topic
    pub fn topic_counts(&mut self, profile: &Profile) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for record in self.store.records(profile)? {
            *counts.entry(record.topic.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Topics grouped by their `Prefix:` (e.g. "Research Note", "Citation")
    pub fn topic_groups(&mut self, profile: &Profile) -> Result<BTreeMap<String, Vec<String>>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for topic in self.store.list_topics(profile)? {
            groups
                .entry(group_name(&topic).to_string())
                .or_default()
                .push(topic);
        }
        Ok(groups)
    }

    /// Records in chronological order
    pub fn timeline(&mut self, profile: &Profile) -> Result<Vec<TimelineEntry>> {
        let mut records: Vec<&Record> = self.store.records(profile)?.iter().collect();
        records.sort_by_key(|r| r.created_at);

        Ok(records
            .into_iter()
            .map(|r| TimelineEntry {
                id: r.id,
                date: r.date_string(),
                topic: r.topic.clone(),
                source: r.source.clone(),
                preview: preview(&r.content, PREVIEW_CHARS),
            })
            .collect())
    }

    /// Search hits grouped by topic, in order of each topic's best hit
    pub fn themes(&mut self, query: &str, top_k: usize, profile: &Profile) -> Result<Vec<Theme>> {
        let hits = self.store.search(query, top_k, profile)?;
        Ok(group_by_topic(hits))
    }

    /// Topics that fuzzily match `query`, best first
    pub fn suggest_topics(
        &mut self,
        query: &str,
        limit: usize,
        profile: &Profile,
    ) -> Result<Vec<String>> {
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, String)> = self
            .store
            .list_topics(profile)?
            .into_iter()
            .filter_map(|topic| matcher.fuzzy_match(&topic, query).map(|s| (s, topic)))
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(scored.into_iter().take(limit).map(|(_, t)| t).collect())
    }
}

/// Pick an answer sentence for `question` out of `hits` (best hit first)
pub fn extract_answer(question: &str, hits: &[ScoredRecord]) -> Answer {
    let Some(best) = hits.first() else {
        return Answer {
            answer: NO_INFORMATION.to_string(),
            context: String::new(),
            source: String::new(),
            topic: String::new(),
        };
    };

    let joined = hits
        .iter()
        .map(|h| h.record.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let context = if joined.split_whitespace().count() > MAX_CONTEXT_WORDS {
        best.record.content.clone()
    } else {
        joined
    };

    let sentences = split_sentences(&context);
    let question_words = word_set(question);

    let answer = sentences
        .iter()
        .find(|s| word_set(s).intersection(&question_words).count() > MIN_WORD_OVERLAP)
        .or_else(|| sentences.first())
        .cloned()
        .unwrap_or_else(|| NO_ANSWER.to_string());

    Answer {
        answer,
        context,
        source: best.record.source.clone(),
        topic: best.record.topic.clone(),
    }
}

/// Split on ". " and give every sentence a trailing period
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.ends_with('.') {
                s.to_string()
            } else {
                format!("{}.", s)
            }
        })
        .collect()
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// `"Research Note: Rust"` -> `"Research Note"`, `"Rust"` -> `"General"`
pub fn group_name(topic: &str) -> &str {
    match topic.split_once(':') {
        Some((prefix, _)) if !prefix.trim().is_empty() => prefix.trim(),
        _ => GENERAL_GROUP,
    }
}

/// First `max_chars` characters, with `...` appended when truncated
pub fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn group_by_topic(hits: Vec<ScoredRecord>) -> Vec<Theme> {
    let mut themes: Vec<Theme> = Vec::new();
    for hit in hits {
        match themes.iter_mut().find(|t| t.topic == hit.record.topic) {
            Some(theme) => theme.hits.push(hit),
            None => themes.push(Theme {
                topic: hit.record.topic.clone(),
                hits: vec![hit],
            }),
        }
    }
    themes
}
