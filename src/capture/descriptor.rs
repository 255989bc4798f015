//! 管道描述解析
//!
//! 语法与 gst-launch 类似：元素之间用 `!` 分隔，每个元素为名称加若干 `key=value` 属性，
//! 属性值可以用双引号包裹以包含空格或 `!`，引号内用 `\"` 和 `\\` 表示引号和反斜杠本身。
//!
//! ```text
//! multifilesrc location="data/frames" loop=true ! videoscale ! appsink name=mysink
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::CaptureError;

/// 管道中的一个元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub properties: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.properties {
            if needs_quotes(value) {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, " {key}=\"{escaped}\"")?;
            } else {
                write!(f, " {key}={value}")?;
            }
        }
        Ok(())
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '!' || c == '"')
}

/// 解析后的管道描述
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDescriptor {
    pub elements: Vec<Element>,
}

impl PipelineDescriptor {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for PipelineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ! ")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Link,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CaptureError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            '\\' if in_quotes => match chars.next_if(|next| matches!(*next, '"' | '\\')) {
                Some(escaped) => current.push(escaped),
                None => current.push(c),
            },
            c if in_quotes => current.push(c),
            '!' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
                tokens.push(Token::Link);
            }
            c if c.is_whitespace() => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(CaptureError::Pipeline("unterminated quote".into()));
    }
    if in_word {
        tokens.push(Token::Word(current));
    }
    Ok(tokens)
}

fn parse_element(words: Vec<String>) -> Result<Element, CaptureError> {
    let mut words = words.into_iter();
    let name = match words.next() {
        Some(name) if !name.is_empty() && !name.contains('=') => name,
        Some(name) => {
            return Err(CaptureError::Pipeline(format!("expected element name, found '{name}'")));
        }
        None => return Err(CaptureError::Pipeline("empty element between '!'".into())),
    };

    let mut element = Element::new(name);
    for word in words {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                element.properties.push((key.to_string(), value.to_string()));
            }
            _ => {
                return Err(CaptureError::Pipeline(format!(
                    "expected key=value property on '{}', found '{word}'",
                    element.name
                )));
            }
        }
    }
    Ok(element)
}

impl FromStr for PipelineDescriptor {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s)?;
        if tokens.is_empty() {
            return Ok(Self::default());
        }

        let mut elements = Vec::new();
        let mut words = Vec::new();
        for token in tokens {
            match token {
                Token::Word(word) => words.push(word),
                Token::Link => elements.push(parse_element(std::mem::take(&mut words))?),
            }
        }
        elements.push(parse_element(words)?);

        Ok(Self { elements })
    }
}
