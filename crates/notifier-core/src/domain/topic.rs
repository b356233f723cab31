//! Topic - 購読トピックの正規化と購読マップ
//!
//! Nomad の event stream は `topic=<Topic>:<filter>` 形式でトピックを受け取ります。
//! ユーザー入力（"deployment, node , job" など）を Nomad が期待する表記
//! （"Deployment", "Node", "Job"）に正規化し、全件受信のワイルドカード付きで
//! 購読マップを組み立てます。

use std::collections::{BTreeMap, BTreeSet};

/// 全件受信を表すセレクタ
pub const WILDCARD: &str = "*";

/// デフォルトの購読トピック
pub const DEFAULT_TOPICS: [&str; 3] = ["Deployment", "Node", "Job"];

/// トピック名を正規化する
///
/// 1. 小文字化
/// 2. 前後の空白を除去
/// 3. 各単語の先頭を大文字化（英数字と `_` 以外の文字の直後を単語境界とみなす）
///
/// 空文字列になる場合は `None`。
pub fn normalize_topic(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut at_boundary = true;
    for c in trimmed.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = !(c.is_alphanumeric() || c == '_');
    }
    Some(out)
}

/// TopicFilter は購読対象トピックの集合
///
/// 重複は集合で自然に畳み込まれます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    topics: BTreeSet<String>,
}

impl TopicFilter {
    /// カンマ区切りの文字列から構築
    ///
    /// 空要素は黙って捨てます。
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    /// トピック名のリストから構築
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topics = names
            .into_iter()
            .filter_map(|name| normalize_topic(name.as_ref()))
            .collect();
        Self { topics }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// `*` を含む場合はすべてのトピックに一致
    pub fn contains(&self, topic: &str) -> bool {
        self.matches_all() || self.topics.contains(topic)
    }

    pub fn matches_all(&self) -> bool {
        self.topics.contains(WILDCARD)
    }

    /// 正規化済みのトピック名（ソート順）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }

    /// トピック → セレクタ の購読マップ
    pub fn subscription_map(&self) -> BTreeMap<String, Vec<String>> {
        self.topics
            .iter()
            .map(|topic| (topic.clone(), vec![WILDCARD.to_string()]))
            .collect()
    }
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self::from_names(DEFAULT_TOPICS)
    }
}
