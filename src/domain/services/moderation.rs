// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// 内容审查错误
#[derive(Error, Debug)]
pub enum ModerationError {
    /// 文本包含被屏蔽的词
    #[error("Content rejected by moderation filter")]
    Rejected,
}

/// 内容审查特质
///
/// 入口路径在消息与工作描述落库前做的防御性复查。
/// 权威词表由外部审查服务持有，这里只按配置的词表兜底。
pub trait ModerationFilter: Send + Sync {
    /// 检查文本
    fn check(&self, text: &str) -> Result<(), ModerationError>;
}

/// 基于词表的审查过滤器
///
/// 词表为空时放行一切
pub struct WordListFilter {
    pattern: Option<Regex>,
}

impl WordListFilter {
    /// 从配置词表构建过滤器
    pub fn from_words(words: &[String]) -> Self {
        if words.is_empty() {
            return Self { pattern: None };
        }

        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        // 词边界匹配，大小写不敏感
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .build()
            .ok();

        Self { pattern }
    }
}

impl ModerationFilter for WordListFilter {
    fn check(&self, text: &str) -> Result<(), ModerationError> {
        match &self.pattern {
            Some(re) if re.is_match(text) => Err(ModerationError::Rejected),
            _ => Ok(()),
        }
    }
}
