//! Content-model grammar.
//!
//! A content model is written as an ordered list of compact tokens, for
//! example `["title", "shortdesc?", "prolog?", "body?"]` or
//! `["%list-blocks*", "section*", "fn*"]`:
//!
//! - a leading `%` makes the token a reference to a [`NodeGroups`] entry
//! - a trailing `?` means zero or one, `+` one or more, `*` zero or more;
//!   no suffix means exactly one
//! - `(a|b|c)*` is an alternation whose members share the trailing
//!   quantifier; a bare `a|b` is an alternation whose members keep their own
//!
//! Order is kept for display only. [`ContentModel::accepts`] checks
//! membership, and the running count kept by the owning node checks
//! cardinality.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Name under which text nodes are matched against content models.
pub const TEXT_NODE_NAME: &str = "text";

/// Errors produced while parsing content-model tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentModelError {
    #[error("content model token '{token}' has an empty name")]
    EmptyName { token: String },

    #[error("content model token '{token}' has unbalanced parentheses")]
    Unbalanced { token: String },

    #[error("content model token '{token}' nests alternations")]
    Nested { token: String },

    #[error("alternation member '{member}' in '{token}' carries its own quantifier")]
    MemberQuantifier { token: String, member: String },

    #[error("content model token '{token}' contains an invalid name")]
    InvalidName { token: String },
}

/// How many times a descriptor may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// No suffix.
    ExactlyOne,
    /// `?`
    ZeroOrOne,
    /// `+`
    OneOrMore,
    /// `*`
    ZeroOrMore,
}

impl Cardinality {
    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            '?' => Some(Cardinality::ZeroOrOne),
            '+' => Some(Cardinality::OneOrMore),
            '*' => Some(Cardinality::ZeroOrMore),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Cardinality::ExactlyOne => "",
            Cardinality::ZeroOrOne => "?",
            Cardinality::OneOrMore => "+",
            Cardinality::ZeroOrMore => "*",
        }
    }

    pub fn required(self) -> bool {
        matches!(self, Cardinality::ExactlyOne | Cardinality::OneOrMore)
    }

    pub fn single(self) -> bool {
        matches!(self, Cardinality::ExactlyOne | Cardinality::ZeroOrOne)
    }
}

/// One child-type descriptor of a content model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildType {
    pub name: String,
    pub is_group: bool,
    pub required: bool,
    pub single: bool,
}

impl ChildType {
    fn new(name: &str, is_group: bool, cardinality: Cardinality) -> Self {
        Self {
            name: name.to_string(),
            is_group,
            required: cardinality.required(),
            single: cardinality.single(),
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match (self.required, self.single) {
            (true, true) => Cardinality::ExactlyOne,
            (false, true) => Cardinality::ZeroOrOne,
            (true, false) => Cardinality::OneOrMore,
            (false, false) => Cardinality::ZeroOrMore,
        }
    }

    /// Literal descriptors match by name, group descriptors by membership.
    pub fn matches(&self, tag: &str, groups: &NodeGroups) -> bool {
        if self.is_group {
            groups.contains(&self.name, tag)
        } else {
            self.name == tag
        }
    }

    fn write_name(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_group {
            write!(f, "%")?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for ChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_name(f)?;
        write!(f, "{}", self.cardinality().suffix())
    }
}

/// A position in a content model: one descriptor, or an alternation.
///
/// Each particle owns one running count, so the members of an alternation
/// share their cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Particle {
    Child(ChildType),
    Choice(Vec<ChildType>),
}

impl Particle {
    pub fn descriptors(&self) -> &[ChildType] {
        match self {
            Particle::Child(child) => std::slice::from_ref(child),
            Particle::Choice(members) => members,
        }
    }

    /// An alternation is required when any member is.
    pub fn required(&self) -> bool {
        self.descriptors().iter().any(|d| d.required)
    }

    /// An alternation is single only when every member is.
    pub fn single(&self) -> bool {
        self.descriptors().iter().all(|d| d.single)
    }

    /// First member accepting `tag`.
    pub fn matching(&self, tag: &str, groups: &NodeGroups) -> Option<&ChildType> {
        self.descriptors().iter().find(|d| d.matches(tag, groups))
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Particle::Child(child) => write!(f, "{child}"),
            Particle::Choice(members) => {
                let shared = members
                    .first()
                    .map(ChildType::cardinality)
                    .filter(|c| members.iter().all(|m| m.cardinality() == *c));
                match shared {
                    Some(cardinality) => {
                        write!(f, "(")?;
                        for (i, member) in members.iter().enumerate() {
                            if i > 0 {
                                write!(f, "|")?;
                            }
                            member.write_name(f)?;
                        }
                        write!(f, "){}", cardinality.suffix())
                    }
                    None => {
                        for (i, member) in members.iter().enumerate() {
                            if i > 0 {
                                write!(f, "|")?;
                            }
                            write!(f, "{member}")?;
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}

/// An ordered list of particles attached to one node type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentModel {
    particles: Vec<Particle>,
}

impl ContentModel {
    /// A model that accepts nothing.
    pub const EMPTY: ContentModel = ContentModel {
        particles: Vec::new(),
    };

    /// Parse a list of grammar tokens.
    ///
    /// Empty tokens contribute nothing, so `[""]` parses to an empty model.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ContentModelError> {
        let mut particles = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(particle) = parse_token(token.as_ref())? {
                particles.push(particle);
            }
        }
        Ok(Self { particles })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// The first descriptor accepting `tag`, if any.
    pub fn accepts(&self, tag: &str, groups: &NodeGroups) -> Option<&ChildType> {
        self.position(tag, groups).map(|(_, child)| child)
    }

    /// Like [`accepts`](Self::accepts), also returning the particle index
    /// that carries the running count.
    pub fn position(&self, tag: &str, groups: &NodeGroups) -> Option<(usize, &ChildType)> {
        self.particles
            .iter()
            .enumerate()
            .find_map(|(index, particle)| particle.matching(tag, groups).map(|c| (index, c)))
    }

    /// Names of every group referenced by the model.
    pub fn group_references(&self) -> impl Iterator<Item = &str> {
        self.particles
            .iter()
            .flat_map(Particle::descriptors)
            .filter(|d| d.is_group)
            .map(|d| d.name.as_str())
    }

    /// Required particles whose running count is still zero.
    ///
    /// `counts` is indexed like [`particles`](Self::particles); missing
    /// entries count as zero.
    pub fn missing_required<'a>(&'a self, counts: &'a [u32]) -> impl Iterator<Item = &'a Particle> {
        self.particles
            .iter()
            .enumerate()
            .filter(|(index, particle)| {
                particle.required() && counts.get(*index).copied().unwrap_or(0) == 0
            })
            .map(|(_, particle)| particle)
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, particle) in self.particles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{particle}")?;
        }
        Ok(())
    }
}

/// Parse a list of grammar tokens into a [`ContentModel`].
pub fn parse_content_model<S: AsRef<str>>(tokens: &[S]) -> Result<ContentModel, ContentModelError> {
    ContentModel::parse(tokens)
}

/// The first descriptor of `model` accepting `tag`, if any.
pub fn accepts<'m>(model: &'m ContentModel, tag: &str, groups: &NodeGroups) -> Option<&'m ChildType> {
    model.accepts(tag, groups)
}

fn parse_token(raw: &str) -> Result<Option<Particle>, ContentModelError> {
    let token = raw.trim();
    if token.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = token.strip_prefix('(') {
        let (body, cardinality) = split_quantifier(rest);
        let inner = body.strip_suffix(')').ok_or_else(|| ContentModelError::Unbalanced {
            token: token.to_string(),
        })?;
        if inner.contains('(') {
            return Err(ContentModelError::Nested {
                token: token.to_string(),
            });
        }
        if inner.contains(')') {
            return Err(ContentModelError::Unbalanced {
                token: token.to_string(),
            });
        }
        let members = inner
            .split('|')
            .map(|member| {
                let (name, own) = split_quantifier(member.trim());
                if own.is_some() {
                    return Err(ContentModelError::MemberQuantifier {
                        token: token.to_string(),
                        member: member.trim().to_string(),
                    });
                }
                parse_name(name, token, cardinality.unwrap_or(Cardinality::ExactlyOne))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(Particle::Choice(members)));
    }

    if token.contains('(') || token.contains(')') {
        return Err(ContentModelError::Unbalanced {
            token: token.to_string(),
        });
    }

    if token.contains('|') {
        let members = token
            .split('|')
            .map(|member| {
                let (name, cardinality) = split_quantifier(member.trim());
                parse_name(name, token, cardinality.unwrap_or(Cardinality::ExactlyOne))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(Particle::Choice(members)));
    }

    let (name, cardinality) = split_quantifier(token);
    parse_name(name, token, cardinality.unwrap_or(Cardinality::ExactlyOne))
        .map(|child| Some(Particle::Child(child)))
}

fn split_quantifier(token: &str) -> (&str, Option<Cardinality>) {
    match token.chars().last().and_then(Cardinality::from_suffix) {
        Some(cardinality) => (&token[..token.len() - 1], Some(cardinality)),
        None => (token, None),
    }
}

fn parse_name(name: &str, token: &str, cardinality: Cardinality) -> Result<ChildType, ContentModelError> {
    let (name, is_group) = match name.strip_prefix('%') {
        Some(group) => (group, true),
        None => (name, false),
    };
    if name.is_empty() {
        return Err(ContentModelError::EmptyName {
            token: token.to_string(),
        });
    }
    let invalid = |c: char| c.is_whitespace() || matches!(c, '%' | '?' | '+' | '*' | '|' | '(' | ')');
    if name.contains(invalid) {
        return Err(ContentModelError::InvalidName {
            token: token.to_string(),
        });
    }
    Ok(ChildType::new(name, is_group, cardinality))
}

/// Named sets of tag names usable as `%group` in content models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroups {
    groups: HashMap<String, HashSet<String>>,
}

impl NodeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or extend) a group.
    pub fn insert<I, S>(&mut self, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(name.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
    }

    pub fn contains(&self, group: &str, tag: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(tag))
    }

    pub fn is_defined(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn members(&self, group: &str) -> Option<&HashSet<String>> {
        self.groups.get(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<K, I, S> FromIterator<(K, I)> for NodeGroups
where
    K: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut groups = NodeGroups::new();
        for (name, members) in iter {
            groups.insert(name, members);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_groups() -> NodeGroups {
        [("all-inline", vec!["b", "i", "u"])].into_iter().collect()
    }

    #[test]
    fn test_parse_quantifiers() {
        let model = ContentModel::parse(&["title", "shortdesc?", "li+", "p*"]).unwrap();
        let cardinalities: Vec<_> = model
            .particles()
            .iter()
            .map(|p| p.descriptors()[0].cardinality())
            .collect();
        assert_eq!(
            cardinalities,
            vec![
                Cardinality::ExactlyOne,
                Cardinality::ZeroOrOne,
                Cardinality::OneOrMore,
                Cardinality::ZeroOrMore,
            ]
        );

        let title = &model.particles()[0].descriptors()[0];
        assert!(title.required && title.single && !title.is_group);
        let p = &model.particles()[3].descriptors()[0];
        assert!(!p.required && !p.single);
    }

    #[test]
    fn test_parse_group_reference() {
        let model = ContentModel::parse(&["%all-inline*"]).unwrap();
        let child = &model.particles()[0].descriptors()[0];
        assert_eq!(child.name, "all-inline");
        assert!(child.is_group);
        assert_eq!(model.group_references().collect::<Vec<_>>(), vec!["all-inline"]);
    }

    #[test]
    fn test_parse_alternation_shares_quantifier() {
        let model = ContentModel::parse(&["(%fig-blocks|image|xref)*"]).unwrap();
        let Particle::Choice(members) = &model.particles()[0] else {
            panic!("expected an alternation");
        };
        assert_eq!(members.len(), 3);
        assert!(members[0].is_group);
        assert!(members.iter().all(|m| m.cardinality() == Cardinality::ZeroOrMore));
        assert_eq!(model.to_string(), "(%fig-blocks|image|xref)*");
    }

    #[test]
    fn test_parse_bare_alternation_keeps_member_quantifiers() {
        let model = ContentModel::parse(&["a?|b+"]).unwrap();
        let particle = &model.particles()[0];
        assert!(particle.required());
        assert!(!particle.single());
        assert_eq!(particle.to_string(), "a?|b+");
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        let model = ContentModel::parse(&[""]).unwrap();
        assert!(model.is_empty());
        assert!(model.accepts("p", &NodeGroups::new()).is_none());
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            ContentModel::parse(&["(a|b"]),
            Err(ContentModelError::Unbalanced { .. })
        ));
        assert!(matches!(
            ContentModel::parse(&["a)"]),
            Err(ContentModelError::Unbalanced { .. })
        ));
        assert!(matches!(
            ContentModel::parse(&["((a|b)|c)"]),
            Err(ContentModelError::Nested { .. })
        ));
        assert!(matches!(
            ContentModel::parse(&["(a?|b)*"]),
            Err(ContentModelError::MemberQuantifier { .. })
        ));
        assert!(matches!(
            ContentModel::parse(&["%*"]),
            Err(ContentModelError::EmptyName { .. })
        ));
        assert!(matches!(
            ContentModel::parse(&["a b"]),
            Err(ContentModelError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_group_resolution() {
        let model = ContentModel::parse(&["%all-inline*"]).unwrap();
        let groups = inline_groups();
        for tag in ["b", "i", "u"] {
            assert!(model.accepts(tag, &groups).is_some(), "{tag} should be accepted");
        }
        assert!(model.accepts("p", &groups).is_none());
    }

    #[test]
    fn test_accepts_returns_first_match() {
        let groups = inline_groups();
        let model = ContentModel::parse(&["b?", "%all-inline*"]).unwrap();
        let (index, child) = model.position("b", &groups).unwrap();
        assert_eq!(index, 0);
        assert_eq!(child.name, "b");
        let (index, child) = model.position("i", &groups).unwrap();
        assert_eq!(index, 1);
        assert_eq!(child.name, "all-inline");
    }

    #[test]
    fn test_accepts_is_deterministic() {
        let groups = inline_groups();
        let model = ContentModel::parse(&["title", "(b|%all-inline)*"]).unwrap();
        let first = accepts(&model, "i", &groups).cloned();
        for _ in 0..10 {
            assert_eq!(accepts(&model, "i", &groups).cloned(), first);
        }
    }

    #[test]
    fn test_missing_required() {
        let model = ContentModel::parse(&["title", "shortdesc?", "(dt|dd)+"]).unwrap();
        let missing: Vec<String> = model
            .missing_required(&[0, 0, 0])
            .map(ToString::to_string)
            .collect();
        assert_eq!(missing, vec!["title", "(dt|dd)+"]);

        assert_eq!(model.missing_required(&[1, 0, 2]).count(), 0);
        // Counts shorter than the model count as zero.
        assert_eq!(model.missing_required(&[1]).count(), 1);
    }

    #[test]
    fn test_display_round_trip() {
        let tokens = ["title", "shortdesc?", "%list-blocks*", "(dt|dd)+"];
        let model = ContentModel::parse(&tokens).unwrap();
        assert_eq!(model.to_string(), tokens.join(", "));
        let rendered = model.to_string();
        let split: Vec<&str> = rendered.split(", ").collect();
        let reparsed = ContentModel::parse(&split[..]).unwrap();
        assert_eq!(reparsed, model);
    }

    #[test]
    fn test_text_pseudo_type() {
        let groups: NodeGroups = [("common-inline", vec![TEXT_NODE_NAME, "ph"])]
            .into_iter()
            .collect();
        let model = ContentModel::parse(&["%common-inline*"]).unwrap();
        assert!(model.accepts(TEXT_NODE_NAME, &groups).is_some());
    }
}
