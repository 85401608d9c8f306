use crate::{HeuristicType, Symbol, Text, Weight};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Top-level statement as reported by the parser.
#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub enum Statement {
    Program { name: Text, parameters: Vec<Text> },
    Rule { head: Head, body: Vec<BodyLiteral> },
    Project(Symbol),
    External(Symbol),
    Show { name: Text, arity: usize, positive: bool },
    /// `#show t: body.`
    ShowTerm { term: Symbol, body: Vec<BodyLiteral> },
    Minimize(Vec<MinimizeElement>),
    Heuristic { atom: Symbol, body: Vec<BodyLiteral>, bias: Weight, priority: u32, kind: HeuristicType },
    Edge { u: Symbol, v: Symbol, body: Vec<BodyLiteral> },
}

#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub enum Head {
    /// Empty for integrity constraints.
    Disjunction(Vec<Symbol>),
    Choice(Vec<Symbol>),
}

#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub enum BodyLiteral {
    Literal { atom: Symbol, positive: bool },
    Sum { elements: Vec<SumElement>, lower: Weight },
}

#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub struct SumElement {
    pub weight: Weight,
    pub atom: Symbol,
    pub positive: bool,
}

/// `weight@priority: literal` inside `#minimize{...}`.
#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub struct MinimizeElement {
    pub weight: Weight,
    pub priority: Weight,
    pub atom: Symbol,
    pub positive: bool,
}

impl Statement {
    pub fn program_header(name: &str, parameters: &[&str]) -> Self {
        Self::Program {
            name: Text::new(name),
            parameters: parameters.iter().copied().map(Text::new).collect(),
        }
    }
    pub fn base_header() -> Self {
        Self::program_header("base", &[])
    }
    pub fn is_base_header(&self) -> bool {
        *self == Self::base_header()
    }
}

fn write_atom(f: &mut Formatter, atom: &Symbol, positive: bool) -> FmtResult {
    if !positive {
        write!(f, "not ")?;
    }
    write!(f, "{atom}")
}

fn write_separated<T: Display>(f: &mut Formatter, items: &[T], sep: &str) -> FmtResult {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_condition(f: &mut Formatter, body: &[BodyLiteral]) -> FmtResult {
    if !body.is_empty() {
        write!(f, ": ")?;
        write_separated(f, body, ", ")?;
    }
    Ok(())
}

impl Display for BodyLiteral {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Literal { atom, positive } => write_atom(f, atom, *positive),
            Self::Sum { elements, lower } => {
                write!(f, "#sum{{")?;
                for (i, SumElement { weight, atom, positive }) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{weight}:")?;
                    write_atom(f, atom, *positive)?;
                }
                write!(f, "}} >= {lower}")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Program { name, parameters } => {
                write!(f, "#program {name}")?;
                if !parameters.is_empty() {
                    write!(f, "(")?;
                    write_separated(f, parameters, ",")?;
                    write!(f, ")")?;
                }
                write!(f, ".")
            }
            Self::Rule { head, body } => {
                let head_written = match head {
                    Head::Choice(atoms) => {
                        write!(f, "{{")?;
                        write_separated(f, atoms, "; ")?;
                        write!(f, "}}")?;
                        true
                    }
                    Head::Disjunction(atoms) => {
                        write_separated(f, atoms, "; ")?;
                        !atoms.is_empty()
                    }
                };
                if !body.is_empty() {
                    if head_written {
                        write!(f, " ")?;
                    }
                    write!(f, ":- ")?;
                    write_separated(f, body, ", ")?;
                }
                write!(f, ".")
            }
            Self::Project(atom) => write!(f, "#project {atom}."),
            Self::External(atom) => write!(f, "#external {atom}."),
            Self::Show { name, arity, positive } => {
                let sign = if *positive { "" } else { "-" };
                write!(f, "#show {sign}{name}/{arity}.")
            }
            Self::ShowTerm { term, body } => {
                write!(f, "#show {term}")?;
                write_condition(f, body)?;
                write!(f, ".")
            }
            Self::Minimize(elements) => {
                write!(f, "#minimize{{")?;
                for (i, MinimizeElement { weight, priority, atom, positive }) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{weight}")?;
                    if *priority != 0 {
                        write!(f, "@{priority}")?;
                    }
                    write!(f, ":")?;
                    write_atom(f, atom, *positive)?;
                }
                write!(f, "}}.")
            }
            Self::Heuristic { atom, body, bias, priority, kind } => {
                write!(f, "#heuristic {atom}")?;
                write_condition(f, body)?;
                write!(f, ". [{bias}@{priority}, {}]", kind.as_str())
            }
            Self::Edge { u, v, body } => {
                write!(f, "#edge ({u},{v})")?;
                write_condition(f, body)?;
                write!(f, ".")
            }
        }
    }
}
