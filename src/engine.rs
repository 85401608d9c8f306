//! The seam to a grounding engine.
//!
//! The engine is opaque: it owns program text, parses it, grounds parts of
//! it, and reports ground rules through an [`Observer`]. A [`Backend`] lets
//! callers add ground rules directly, which the engine reports the same way.

use crate::ast::Statement;
use crate::{Atom, HeuristicType, Literal, Observer, Result, Symbol, TruthValue, Weight};

/// A named program part with the arguments for its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub args: Vec<Symbol>,
}

impl Part {
    pub fn new(name: &str, args: Vec<Symbol>) -> Self {
        Self { name: name.to_string(), args }
    }
    pub fn base() -> Self {
        Self::new("base", vec![])
    }
}

/// An entry of the engine's atom base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicAtom {
    pub symbol: Symbol,
    pub atom: Atom,
    pub is_fact: bool,
}

pub trait Engine {
    /// Adds source text as part `name` with the given parameters.
    fn add(&mut self, name: &str, params: &[&str], text: &str) -> Result<()>;
    /// Parses `text`, reporting each top-level statement in order.
    fn parse(&self, text: &str, on_statement: &mut dyn FnMut(Statement) -> Result<()>) -> Result<()>;
    /// Adds one parsed statement. `#program` headers switch the current part.
    fn add_statement(&mut self, statement: &Statement) -> Result<()>;
    /// Grounds the given parts, reporting every ground construct to `observer`.
    fn ground(&mut self, parts: &[Part], observer: &mut dyn Observer) -> Result<()>;
    /// Opens a backend whose additions are reported to `observer`.
    fn backend<'a>(&'a mut self, observer: Box<dyn Observer + 'a>) -> Box<dyn Backend + 'a>;
    /// Atoms with a symbol, in atom order.
    fn symbolic_atoms(&self) -> Vec<SymbolicAtom>;
}

pub trait Backend {
    /// Returns the atom of `symbol`, or a fresh anonymous atom for `None`.
    fn add_atom(&mut self, symbol: Option<&Symbol>) -> Result<Atom>;
    fn add_rule(&mut self, choice: bool, head: &[Atom], body: &[i32]) -> Result<()>;
    fn add_weight_rule(
        &mut self,
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
    ) -> Result<()>;
    fn add_project(&mut self, atoms: &[Atom]) -> Result<()>;
    fn add_external(&mut self, atom: Atom, value: TruthValue) -> Result<()>;
    fn add_assume(&mut self, literals: &[i32]) -> Result<()>;
    fn add_heuristic(
        &mut self,
        atom: Atom,
        kind: HeuristicType,
        bias: Weight,
        priority: u32,
        condition: &[i32],
    ) -> Result<()>;
    fn add_minimize(&mut self, priority: Weight, literals: &[(i32, Weight)]) -> Result<()>;
    fn add_acyc_edge(&mut self, node_u: i32, node_v: i32, condition: &[i32]) -> Result<()>;
}

/// Backend wrapper taking symbols instead of atoms and literals.
pub struct SymbolicBackend<'a> {
    backend: &'a mut dyn Backend,
}

impl<'a> SymbolicBackend<'a> {
    pub fn new(backend: &'a mut dyn Backend) -> Self {
        Self { backend }
    }
    pub fn add_atom(&mut self, symbol: &Symbol) -> Result<Atom> {
        self.backend.add_atom(Some(symbol))
    }
    fn atoms(&mut self, symbols: &[Symbol]) -> Result<Vec<Atom>> {
        symbols.iter().map(|symbol| self.add_atom(symbol)).collect()
    }
    fn literals(&mut self, pos: &[Symbol], neg: &[Symbol]) -> Result<Vec<i32>> {
        let mut literals = Vec::with_capacity(pos.len() + neg.len());
        for symbol in pos {
            literals.push(Literal::positive(self.add_atom(symbol)?)?.get());
        }
        for symbol in neg {
            literals.push(Literal::negative(self.add_atom(symbol)?)?.get());
        }
        Ok(literals)
    }
    fn weighted_literals(
        &mut self,
        pos: &[(Symbol, Weight)],
        neg: &[(Symbol, Weight)],
    ) -> Result<Vec<(i32, Weight)>> {
        let mut literals = Vec::with_capacity(pos.len() + neg.len());
        for (symbol, weight) in pos {
            literals.push((Literal::positive(self.add_atom(symbol)?)?.get(), *weight));
        }
        for (symbol, weight) in neg {
            literals.push((Literal::negative(self.add_atom(symbol)?)?.get(), *weight));
        }
        Ok(literals)
    }
    pub fn add_rule(
        &mut self,
        head: &[Symbol],
        pos_body: &[Symbol],
        neg_body: &[Symbol],
        choice: bool,
    ) -> Result<()> {
        let head = self.atoms(head)?;
        let body = self.literals(pos_body, neg_body)?;
        self.backend.add_rule(choice, &head, &body)
    }
    pub fn add_weight_rule(
        &mut self,
        head: &[Symbol],
        lower: Weight,
        pos_body: &[(Symbol, Weight)],
        neg_body: &[(Symbol, Weight)],
        choice: bool,
    ) -> Result<()> {
        let head = self.atoms(head)?;
        let body = self.weighted_literals(pos_body, neg_body)?;
        self.backend.add_weight_rule(choice, &head, &body, lower)
    }
    pub fn add_project(&mut self, symbols: &[Symbol]) -> Result<()> {
        let atoms = self.atoms(symbols)?;
        self.backend.add_project(&atoms)
    }
    pub fn add_external(&mut self, symbol: &Symbol, value: TruthValue) -> Result<()> {
        let atom = self.add_atom(symbol)?;
        self.backend.add_external(atom, value)
    }
    pub fn add_assume(&mut self, symbols: &[Symbol]) -> Result<()> {
        let literals = self.literals(symbols, &[])?;
        self.backend.add_assume(&literals)
    }
    pub fn add_heuristic(
        &mut self,
        symbol: &Symbol,
        kind: HeuristicType,
        bias: Weight,
        priority: u32,
        pos_condition: &[Symbol],
        neg_condition: &[Symbol],
    ) -> Result<()> {
        let atom = self.add_atom(symbol)?;
        let condition = self.literals(pos_condition, neg_condition)?;
        self.backend.add_heuristic(atom, kind, bias, priority, &condition)
    }
    pub fn add_minimize(
        &mut self,
        priority: Weight,
        pos_literals: &[(Symbol, Weight)],
        neg_literals: &[(Symbol, Weight)],
    ) -> Result<()> {
        let literals = self.weighted_literals(pos_literals, neg_literals)?;
        self.backend.add_minimize(priority, &literals)
    }
    pub fn add_acyc_edge(
        &mut self,
        node_u: i32,
        node_v: i32,
        pos_condition: &[Symbol],
        neg_condition: &[Symbol],
    ) -> Result<()> {
        let condition = self.literals(pos_condition, neg_condition)?;
        self.backend.add_acyc_edge(node_u, node_v, &condition)
    }
}
