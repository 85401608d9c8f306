//! Ground program entities as recorded from backend events.
//!
//! Every entity carries the epoch (`order`) it was produced in. Fields are
//! declared so the derived orderings compare the epoch first and the
//! kind-specific fields afterwards; `GroundObject` puts the kind in front of
//! both.

use crate::{Atom, Epoch, Error, HeuristicType, Literal, Result, Symbol, TruthValue, Weight};

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Rule {
    pub order: Epoch,
    pub head: Vec<Atom>,
    pub body: Vec<Literal>,
    pub choice: bool,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct WeightRule {
    pub order: Epoch,
    pub head: Vec<Atom>,
    pub body: Vec<(Literal, Weight)>,
    pub lower: Weight,
    pub choice: bool,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Project {
    pub order: Epoch,
    pub atoms: Vec<Atom>,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct OutputAtom {
    pub order: Epoch,
    pub symbol: Symbol,
    /// `0` when the symbol is a fact without a backing atom.
    pub atom: Atom,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct External {
    pub order: Epoch,
    pub atom: Atom,
    pub value: TruthValue,
}

/// `#show t: condition.` as reported by the engine's `output_term` event.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Show {
    pub order: Epoch,
    pub symbol: Symbol,
    pub condition: Vec<Literal>,
}

/// One priority level of an optimization statement. Weights may be negative.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Minimize {
    pub order: Epoch,
    pub priority: Weight,
    pub literals: Vec<(Literal, Weight)>,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Heuristic {
    pub order: Epoch,
    pub atom: Atom,
    pub kind: HeuristicType,
    pub bias: Weight,
    pub priority: u32,
    pub condition: Vec<Literal>,
}

/// Acyclicity edge between two engine-numbered nodes.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Edge {
    pub order: Epoch,
    pub u: i32,
    pub v: i32,
    pub condition: Vec<Literal>,
}

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
pub struct Assume {
    pub order: Epoch,
    pub literals: Vec<Literal>,
}

/// Variant order is the kind priority used when sorting mixed programs.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone)]
#[repr(u8)]
pub enum GroundObject {
    Rule(Rule) = 0,
    WeightRule(WeightRule) = 1,
    Project(Project) = 2,
    OutputAtom(OutputAtom) = 3,
    External(External) = 4,
    Show(Show) = 5,
    Minimize(Minimize) = 6,
    Heuristic(Heuristic) = 7,
    Edge(Edge) = 8,
    Assume(Assume) = 9,
}

/////////////////////

pub(crate) fn checked_atoms(atoms: &[Atom], what: &str) -> Result<Vec<Atom>> {
    match atoms.iter().position(|&atom| atom == 0) {
        Some(i) => Err(Error::MalformedEvent(format!("{what} atom #{i} is 0"))),
        None => Ok(atoms.to_vec()),
    }
}

pub(crate) fn checked_literals(literals: &[i32]) -> Result<Vec<Literal>> {
    literals.iter().map(|&lit| Literal::new(lit)).collect()
}

pub(crate) fn checked_weight(weight: Weight, what: &str) -> Result<Weight> {
    if weight < 0 {
        Err(Error::MalformedEvent(format!("{what} {weight} is negative")))
    } else {
        Ok(weight)
    }
}

impl Rule {
    pub fn new(choice: bool, head: &[Atom], body: &[i32], order: Epoch) -> Result<Self> {
        Ok(Self {
            order,
            head: checked_atoms(head, "head")?,
            body: checked_literals(body)?,
            choice,
        })
    }
    pub fn is_fact(&self) -> bool {
        !self.choice && self.body.is_empty() && self.head.len() == 1
    }
}

impl WeightRule {
    pub fn new(
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
        order: Epoch,
    ) -> Result<Self> {
        let body = body
            .iter()
            .map(|&(lit, weight)| Ok((Literal::new(lit)?, checked_weight(weight, "weight")?)))
            .collect::<Result<_>>()?;
        Ok(Self {
            order,
            head: checked_atoms(head, "head")?,
            body,
            lower: checked_weight(lower, "lower bound")?,
            choice,
        })
    }
}

impl Project {
    pub fn new(atoms: &[Atom], order: Epoch) -> Result<Self> {
        Ok(Self { order, atoms: checked_atoms(atoms, "project")? })
    }
}

impl External {
    pub fn new(atom: Atom, value: TruthValue, order: Epoch) -> Result<Self> {
        let atom = checked_atoms(&[atom], "external")?[0];
        Ok(Self { order, atom, value })
    }
}

impl Show {
    pub fn new(symbol: Symbol, condition: &[i32], order: Epoch) -> Result<Self> {
        Ok(Self { order, symbol, condition: checked_literals(condition)? })
    }
}

impl Minimize {
    pub fn new(priority: Weight, literals: &[(i32, Weight)], order: Epoch) -> Result<Self> {
        let literals = literals
            .iter()
            .map(|&(lit, weight)| Ok((Literal::new(lit)?, weight)))
            .collect::<Result<_>>()?;
        Ok(Self { order, priority, literals })
    }
}

impl Heuristic {
    pub fn new(
        atom: Atom,
        kind: HeuristicType,
        bias: Weight,
        priority: u32,
        condition: &[i32],
        order: Epoch,
    ) -> Result<Self> {
        let atom = checked_atoms(&[atom], "heuristic")?[0];
        Ok(Self { order, atom, kind, bias, priority, condition: checked_literals(condition)? })
    }
}

impl Edge {
    pub fn new(u: i32, v: i32, condition: &[i32], order: Epoch) -> Result<Self> {
        Ok(Self { order, u, v, condition: checked_literals(condition)? })
    }
}

impl Assume {
    pub fn new(literals: &[i32], order: Epoch) -> Result<Self> {
        Ok(Self { order, literals: checked_literals(literals)? })
    }
}

impl GroundObject {
    pub fn order(&self) -> Epoch {
        match self {
            Self::Rule(x) => x.order,
            Self::WeightRule(x) => x.order,
            Self::Project(x) => x.order,
            Self::OutputAtom(x) => x.order,
            Self::External(x) => x.order,
            Self::Show(x) => x.order,
            Self::Minimize(x) => x.order,
            Self::Heuristic(x) => x.order,
            Self::Edge(x) => x.order,
            Self::Assume(x) => x.order,
        }
    }
    /// Atoms this object refers to, excluding the `0` of fact output atoms.
    pub fn visit_atoms(&self, visitor: &mut impl FnMut(Atom)) {
        match self {
            Self::Rule(x) => {
                x.head.iter().copied().for_each(&mut *visitor);
                x.body.iter().map(|lit| lit.atom()).for_each(visitor);
            }
            Self::WeightRule(x) => {
                x.head.iter().copied().for_each(&mut *visitor);
                x.body.iter().map(|(lit, _)| lit.atom()).for_each(visitor);
            }
            Self::Project(x) => x.atoms.iter().copied().for_each(visitor),
            Self::OutputAtom(x) if x.atom != 0 => visitor(x.atom),
            Self::OutputAtom(_) => {}
            Self::External(x) => visitor(x.atom),
            Self::Show(x) => x.condition.iter().map(|lit| lit.atom()).for_each(visitor),
            Self::Minimize(x) => x.literals.iter().map(|(lit, _)| lit.atom()).for_each(visitor),
            Self::Heuristic(x) => {
                visitor(x.atom);
                x.condition.iter().map(|lit| lit.atom()).for_each(visitor);
            }
            Self::Edge(x) => x.condition.iter().map(|lit| lit.atom()).for_each(visitor),
            Self::Assume(x) => x.literals.iter().map(|lit| lit.atom()).for_each(visitor),
        }
    }
}

macro_rules! ground_object_from {
    ($($kind:ident),*) => {$(
        impl From<$kind> for GroundObject {
            fn from(x: $kind) -> Self {
                Self::$kind(x)
            }
        }
    )*};
}
ground_object_from!(
    Rule, WeightRule, Project, OutputAtom, External, Show, Minimize, Heuristic, Edge, Assume
);
