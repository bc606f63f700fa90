//! Context template parsing and rendering.
//!
//! Templates use `{context}` and `{query}` placeholders. `{{` and `}}` are
//! literal braces, so templates written for Python's `str.format` keep
//! working unchanged.

use crate::error::TemplateError;

pub const CONTEXT_PLACEHOLDER: &str = "context";
pub const QUERY_PLACEHOLDER: &str = "query";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Query,
}

/// A parsed context template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if chars.next_if(|&(_, next)| next == '{').is_some() {
                        literal.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, '{')) | None => {
                                return Err(TemplateError::UnbalancedBrace { position: pos });
                            }
                            Some((_, ch)) => name.push(ch),
                        }
                    }
                    let segment = match name.as_str() {
                        CONTEXT_PLACEHOLDER => Segment::Context,
                        QUERY_PLACEHOLDER => Segment::Query,
                        _ => return Err(TemplateError::UnknownPlaceholder(name)),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    if chars.next_if(|&(_, next)| next == '}').is_none() {
                        return Err(TemplateError::UnbalancedBrace { position: pos });
                    }
                    literal.push('}');
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Parse and additionally require both placeholders to appear.
    pub fn parse_strict(source: &str) -> Result<Self, TemplateError> {
        let template = Self::parse(source)?;
        if !template.segments.contains(&Segment::Context) {
            return Err(TemplateError::MissingPlaceholder(CONTEXT_PLACEHOLDER));
        }
        if !template.segments.contains(&Segment::Query) {
            return Err(TemplateError::MissingPlaceholder(QUERY_PLACEHOLDER));
        }
        Ok(template)
    }

    /// Substitute the placeholders.
    pub fn render(&self, context: &str, query: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Context => out.push_str(context),
                Segment::Query => out.push_str(query),
            }
        }
        out
    }
}
