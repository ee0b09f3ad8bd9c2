//! Model specifications and formula parsing
//!
//! Supports the subset of Wilkinson notation used for track models:
//! `y ~ a + b + a:b`, `a*b` (= `a + b + a:b`), and `- 1` / `+ 0` to drop
//! the intercept.

use std::fmt;

use crate::errors::{StatsError, StatsResult};
use crate::types::ModelFamily;

/// A model term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Main effect of one column
    Main(String),
    /// Product of two main effects
    Interaction(String, String),
}

impl Term {
    pub fn main(column: impl Into<String>) -> Self {
        Term::Main(column.into())
    }

    pub fn interaction(left: impl Into<String>, right: impl Into<String>) -> Self {
        Term::Interaction(left.into(), right.into())
    }

    /// Columns the term reads
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Term::Main(c) => vec![c.as_str()],
            Term::Interaction(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Main(c) => write!(f, "{}", c),
            Term::Interaction(a, b) => write!(f, "{}:{}", a, b),
        }
    }
}

/// Dependent variable, ordered terms, and family of a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub dependent: String,
    pub terms: Vec<Term>,
    pub family: ModelFamily,
    /// Set to false by `- 1` / `+ 0` in a parsed formula
    pub intercept: bool,
}

impl ModelSpec {
    pub fn new(dependent: impl Into<String>, family: ModelFamily) -> Self {
        Self {
            dependent: dependent.into(),
            terms: Vec::new(),
            family,
            intercept: true,
        }
    }

    pub fn term(mut self, column: impl Into<String>) -> Self {
        self.push(Term::main(column));
        self
    }

    pub fn interaction(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.push(Term::interaction(left, right));
        self
    }

    fn push(&mut self, term: Term) {
        if !self.terms.contains(&term) {
            self.terms.push(term);
        }
    }

    /// Parse `dependent ~ term + term ...`
    ///
    /// # Errors
    /// `InvalidFormula` for a missing `~`, an empty side, an empty term, or an
    /// interaction of more than two columns.
    pub fn parse(formula: &str, family: ModelFamily) -> StatsResult<Self> {
        let invalid = |message: &str| StatsError::InvalidFormula {
            formula: formula.to_string(),
            message: message.to_string(),
        };

        let (lhs, rhs) = formula
            .split_once('~')
            .ok_or_else(|| invalid("missing '~'"))?;
        let dependent = lhs.trim();
        if dependent.is_empty() {
            return Err(invalid("missing dependent variable"));
        }
        if !is_identifier(dependent) {
            return Err(invalid("dependent variable must be a single column name"));
        }

        let mut spec = ModelSpec::new(dependent, family);
        let rhs = rhs.trim();
        if rhs.is_empty() {
            return Err(invalid("missing right-hand side"));
        }

        for (sign, raw_term) in split_signed(rhs) {
            let term = raw_term.trim();
            if term.is_empty() {
                return Err(invalid("empty term"));
            }
            match (sign, term) {
                ('+', "1") => spec.intercept = true,
                ('+', "0") | ('-', "1") => spec.intercept = false,
                ('-', _) => return Err(invalid("only '- 1' may be subtracted")),
                _ => spec.push_parsed(term).map_err(|m| invalid(m))?,
            }
        }

        Ok(spec)
    }

    fn push_parsed(&mut self, term: &str) -> Result<(), &'static str> {
        if let Some((a, b)) = term.split_once('*') {
            let (a, b) = (a.trim(), b.trim());
            check_operands(a, b)?;
            self.push(Term::main(a));
            self.push(Term::main(b));
            self.push(Term::interaction(a, b));
        } else if let Some((a, b)) = term.split_once(':') {
            let (a, b) = (a.trim(), b.trim());
            check_operands(a, b)?;
            self.push(Term::interaction(a, b));
        } else if is_identifier(term) {
            self.push(Term::main(term));
        } else {
            return Err("term must be a column name");
        }
        Ok(())
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.dependent)?;
        let mut parts: Vec<String> = self.terms.iter().map(Term::label).collect();
        if !self.intercept {
            parts.push("0".to_string());
        }
        if parts.is_empty() {
            parts.push("1".to_string());
        }
        write!(f, "{}", parts.join(" + "))
    }
}

fn check_operands(a: &str, b: &str) -> Result<(), &'static str> {
    if !is_identifier(a) || !is_identifier(b) {
        return Err("interactions take exactly two column names");
    }
    if a == b {
        return Err("a column cannot interact with itself");
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Split a right-hand side on top-level `+` / `-`, keeping each part's sign
fn split_signed(rhs: &str) -> Vec<(char, &str)> {
    let mut parts = Vec::new();
    let mut sign = '+';
    let mut start = 0;
    for (i, c) in rhs.char_indices() {
        if c == '+' || c == '-' {
            parts.push((sign, &rhs[start..i]));
            sign = c;
            start = i + c.len_utf8();
        }
    }
    parts.push((sign, &rhs[start..]));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_main_effects() {
        let spec = ModelSpec::parse("track_popularity ~ mode + danceability", ModelFamily::Linear)
            .unwrap();
        assert_eq!(spec.dependent, "track_popularity");
        assert_eq!(spec.terms, vec![Term::main("mode"), Term::main("danceability")]);
        assert!(spec.intercept);
    }

    #[test]
    fn test_star_expands_to_main_effects_and_interaction() {
        let spec = ModelSpec::parse("y ~ mode * energy + tempo", ModelFamily::Linear).unwrap();
        assert_eq!(
            spec.terms,
            vec![
                Term::main("mode"),
                Term::main("energy"),
                Term::interaction("mode", "energy"),
                Term::main("tempo"),
            ]
        );
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let spec = ModelSpec::parse("y ~ a + b + a*b + a", ModelFamily::Linear).unwrap();
        assert_eq!(spec.terms.len(), 3);
        assert_eq!(spec.to_string(), "y ~ a + b + a:b");
    }

    #[test]
    fn test_drop_intercept() {
        let spec = ModelSpec::parse("y ~ a - 1", ModelFamily::Linear).unwrap();
        assert!(!spec.intercept);
        assert_eq!(spec.terms, vec![Term::main("a")]);

        let spec = ModelSpec::parse("y ~ 0 + a", ModelFamily::Linear).unwrap();
        assert!(!spec.intercept);
    }

    #[test]
    fn test_invalid_formulas() {
        for bad in ["y", "~ a", "y ~", "y ~ a +", "y ~ a:b:c", "y ~ a - b", "y ~ a:a", "y z ~ a"] {
            assert!(
                matches!(
                    ModelSpec::parse(bad, ModelFamily::Linear),
                    Err(StatsError::InvalidFormula { .. })
                ),
                "accepted '{}'",
                bad
            );
        }
    }

    #[test]
    fn test_builder_matches_parse() {
        let built = ModelSpec::new("y", ModelFamily::Logistic)
            .term("a")
            .term("b")
            .interaction("a", "b");
        let parsed = ModelSpec::parse("y ~ a*b", ModelFamily::Logistic).unwrap();
        assert_eq!(built, parsed);
    }
}
