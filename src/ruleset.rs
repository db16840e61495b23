//! Conditional annotation rules.
//!
//! A rule copies a fixed value into a target annotation of every signal whose source annotation
//! holds an expected value. Rules come either from a CSV table or from a built-in ruleset.

use std::{io::Read, path::Path};

use sim_kind::signal_group::Signal;

use crate::Error;

/// Column roles of a rule table. The header row must name them exactly, in this order.
pub const RULE_HEADER: [&str; 4] = ["Annotation", "Value", "FmiAnnotation", "FmiValue"];

/// Name of the built-in ruleset deriving FMI causality from the signal direction.
pub const SIGNAL_DIRECTION: &str = "signal-direction";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub source_key: String,
    pub source_value: String,
    pub target_key: String,
    pub target_value: String,
}

impl Rule {
    pub fn new(source_key: &str, source_value: &str, target_key: &str, target_value: &str) -> Self {
        Self {
            source_key: source_key.to_string(),
            source_value: source_value.to_string(),
            target_key: target_key.to_string(),
            target_value: target_value.to_string(),
        }
    }

    /// Returns true if the rule changed the signal.
    fn apply(&self, signal: &mut Signal) -> bool {
        if signal.annotation_str(&self.source_key) != Some(self.source_value.as_str()) {
            return false;
        }
        signal
            .annotations
            .insert(self.target_key.clone(), self.target_value.as_str().into());
        true
    }
}

/// An ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Ruleset {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Load a rule table from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Load(format!("{}: {e}", path.display())))?;
        Self::from_reader(file).map_err(|e| match e {
            Error::Load(reason) => Error::Load(format!("{}: {reason}", path.display())),
            e => e,
        })
    }

    /// Load a rule table from CSV text. The first row is the header and is never applied.
    pub fn from_reader(reader: impl Read) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| Error::Load("empty rule table".to_string()))?
            .map_err(|e| Error::Load(e.to_string()))?;
        if header.iter().ne(RULE_HEADER) {
            return Err(Error::Load(format!(
                "unexpected header {:?}, expected {:?}",
                header.iter().collect::<Vec<_>>(),
                RULE_HEADER
            )));
        }

        let mut rules = Vec::new();
        for (line, record) in records.enumerate() {
            let record = record.map_err(|e| Error::Load(e.to_string()))?;
            match record.iter().collect::<Vec<_>>().as_slice() {
                [source_key, source_value, target_key, target_value] => rules.push(Rule::new(
                    source_key,
                    source_value,
                    target_key,
                    target_value,
                )),
                fields => {
                    return Err(Error::Load(format!(
                        "rule {} has {} fields, expected 4",
                        line + 1,
                        fields.len()
                    )))
                }
            }
        }
        Ok(Self { rules })
    }

    /// A built-in ruleset by name.
    pub fn builtin(name: &str) -> Result<Self, Error> {
        match name {
            SIGNAL_DIRECTION => Ok(Self::new(vec![
                Rule::new("direction", "input", "fmi_variable_causality", "input"),
                Rule::new("direction", "output", "fmi_variable_causality", "output"),
            ])),
            _ => Err(Error::Load(format!("Ruleset not supported: {name}"))),
        }
    }

    /// Select the ruleset of a run: a rule file takes precedence over a named built-in ruleset.
    /// Neither given means no ruleset.
    pub fn resolve(rule_file: Option<&Path>, name: Option<&str>) -> Result<Option<Self>, Error> {
        match (rule_file, name.filter(|n| !n.is_empty())) {
            (Some(path), _) => Self::from_csv_path(path).map(Some),
            (None, Some(name)) => Self::builtin(name).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to `signal`. Returns the count of rules which matched.
    pub fn apply(&self, signal: &mut Signal) -> usize {
        self.rules.iter().filter(|rule| rule.apply(signal)).count()
    }
}
