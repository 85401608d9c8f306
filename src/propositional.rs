//! A small grounding engine for variable-free programs.
//!
//! Program parts are grounded by substituting their parameters and numbering
//! atoms on first occurrence. It reports to an [`Observer`] the way a full
//! grounder does: facts become bodiless rules plus an output atom without a
//! backing atom, `#sum` bodies become weight rules over an auxiliary atom,
//! and every other shown atom gets one output atom. Positive literals over
//! atoms already known to be facts are dropped from bodies.

use crate::ast::{BodyLiteral, Head, MinimizeElement, Statement};
use crate::engine::{Backend, Engine, Part, SymbolicAtom};
use crate::{
    parse, Atom, Error, HeuristicType, Literal, Observer, Result, Symbol, Text, TruthValue, Weight,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

struct Block {
    name: Text,
    params: Vec<Text>,
    statements: Vec<Statement>,
}

#[derive(Default)]
pub struct PropositionalEngine {
    blocks: Vec<Block>,
    /// Block receiving statements from `add_statement`.
    current: Option<usize>,
    atoms: HashMap<Symbol, Atom>,
    symbols: Vec<Option<Symbol>>,
    facts: HashSet<Atom>,
    output: HashSet<Atom>,
    /// Signatures from `#show name/arity.`
    shows: HashSet<(Text, usize, bool)>,
    /// Set by any `#show` statement; atoms then need a matching signature.
    hide_unshown: bool,
    nodes: HashMap<Symbol, i32>,
}

impl Block {
    fn new(name: Text, params: Vec<Text>) -> Self {
        Self { name, params, statements: vec![] }
    }
}

fn substitute(symbol: &Symbol, assignment: &HashMap<Text, Symbol>) -> Symbol {
    match symbol {
        Symbol::Function { name, args, positive } if args.is_empty() => {
            match assignment.get(name) {
                Some(value) if *positive => value.clone(),
                Some(value) => value.clone().negated(),
                None => symbol.clone(),
            }
        }
        Symbol::Function { name, args, positive } => Symbol::Function {
            name: *name,
            args: args.iter().map(|arg| substitute(arg, assignment)).collect(),
            positive: *positive,
        },
        _ => symbol.clone(),
    }
}

impl PropositionalEngine {
    pub fn new() -> Self {
        Self::default()
    }
    /// Number of atoms allocated so far.
    pub fn atom_count(&self) -> usize {
        self.symbols.len()
    }
    pub fn symbol(&self, atom: Atom) -> Option<&Symbol> {
        self.symbols.get(atom.checked_sub(1)? as usize)?.as_ref()
    }
    fn fresh_atom(&mut self, symbol: Option<Symbol>) -> Atom {
        self.symbols.push(symbol);
        self.symbols.len() as Atom
    }
    fn atom(&mut self, symbol: &Symbol) -> Atom {
        if let Some(&atom) = self.atoms.get(symbol) {
            return atom;
        }
        let atom = self.fresh_atom(Some(symbol.clone()));
        self.atoms.insert(symbol.clone(), atom);
        atom
    }
    fn literal(&mut self, symbol: &Symbol, positive: bool) -> Result<i32> {
        let atom = self.atom(symbol);
        let lit = if positive { Literal::positive(atom) } else { Literal::negative(atom) };
        Ok(lit?.get())
    }
    fn shown(&self, symbol: &Symbol) -> bool {
        if !self.hide_unshown {
            return true;
        }
        symbol.signature().is_some_and(|signature| self.shows.contains(&signature))
    }
    fn node(&mut self, symbol: &Symbol) -> i32 {
        let next = self.nodes.len() as i32;
        *self.nodes.entry(symbol.clone()).or_insert(next)
    }
    fn ground_body(&mut self, body: &[BodyLiteral], observer: &mut dyn Observer) -> Result<Vec<i32>> {
        let mut literals = Vec::with_capacity(body.len());
        for element in body {
            match element {
                BodyLiteral::Literal { atom, positive } => {
                    let lit = self.literal(atom, *positive)?;
                    if !(*positive && self.facts.contains(&Literal::new(lit)?.atom())) {
                        literals.push(lit);
                    }
                }
                BodyLiteral::Sum { elements, lower } => {
                    let weighted = elements
                        .iter()
                        .map(|e| Ok((self.literal(&e.atom, e.positive)?, e.weight)))
                        .collect::<Result<Vec<(i32, Weight)>>>()?;
                    let aux = self.fresh_atom(None);
                    observer.add_weight_rule(false, &[aux], &weighted, *lower)?;
                    literals.push(Literal::positive(aux)?.get());
                }
            }
        }
        Ok(literals)
    }
    fn ground_statement(&mut self, statement: &Statement, observer: &mut dyn Observer) -> Result<()> {
        trace!(%statement, "grounding statement");
        match statement {
            Statement::Program { .. } => Ok(()),
            Statement::Rule { head, body } => {
                let body = self.ground_body(body, observer)?;
                let (choice, head) = match head {
                    Head::Choice(atoms) => (true, atoms),
                    Head::Disjunction(atoms) => (false, atoms),
                };
                let head: Vec<Atom> = head.iter().map(|symbol| self.atom(symbol)).collect();
                if !choice && head.len() == 1 && body.is_empty() {
                    self.facts.insert(head[0]);
                }
                observer.add_rule(choice, &head, &body)
            }
            Statement::Project(symbol) => {
                let atom = self.atom(symbol);
                observer.add_project(&[atom])
            }
            Statement::External(symbol) => {
                let atom = self.atom(symbol);
                observer.add_external(atom, TruthValue::False)
            }
            Statement::Show { name, arity, positive } => {
                self.hide_unshown = true;
                self.shows.insert((*name, *arity, *positive));
                Ok(())
            }
            Statement::ShowTerm { term, body } => {
                self.hide_unshown = true;
                let condition = self.ground_body(body, observer)?;
                observer.add_output_term(term, &condition)
            }
            Statement::Minimize(elements) => {
                let mut levels: BTreeMap<Weight, Vec<(i32, Weight)>> = BTreeMap::new();
                for MinimizeElement { weight, priority, atom, positive } in elements {
                    let lit = self.literal(atom, *positive)?;
                    levels.entry(*priority).or_default().push((lit, *weight));
                }
                for (priority, literals) in levels.iter().rev() {
                    observer.add_minimize(*priority, literals)?;
                }
                Ok(())
            }
            Statement::Heuristic { atom, body, bias, priority, kind } => {
                let atom = self.atom(atom);
                let condition = self.ground_body(body, observer)?;
                observer.add_heuristic(atom, *kind, *bias, *priority, &condition)
            }
            Statement::Edge { u, v, body } => {
                let (u, v) = (self.node(u), self.node(v));
                let condition = self.ground_body(body, observer)?;
                observer.add_acyc_edge(u, v, &condition)
            }
        }
    }
    /// Reports output atoms for shown atoms not reported before. Facts are
    /// reported without their atom.
    fn flush_output(&mut self, observer: &mut dyn Observer) -> Result<()> {
        for (i, symbol) in self.symbols.iter().enumerate() {
            let atom = i as Atom + 1;
            let Some(symbol) = symbol else { continue };
            if !self.shown(symbol) || !self.output.insert(atom) {
                continue;
            }
            let reported = if self.facts.contains(&atom) { 0 } else { atom };
            observer.add_output_atom(symbol, reported)?;
        }
        Ok(())
    }
}

impl Engine for PropositionalEngine {
    fn add(&mut self, name: &str, params: &[&str], text: &str) -> Result<()> {
        let params = params.iter().copied().map(Text::new).collect();
        self.blocks.push(Block::new(Text::new(name), params));
        for statement in parse::statements(text)? {
            match statement {
                Statement::Program { name, parameters } => {
                    self.blocks.push(Block::new(name, parameters))
                }
                statement => {
                    if let Some(block) = self.blocks.last_mut() {
                        block.statements.push(statement)
                    }
                }
            }
        }
        Ok(())
    }
    fn parse(&self, text: &str, on_statement: &mut dyn FnMut(Statement) -> Result<()>) -> Result<()> {
        parse::statements(text)?.into_iter().try_for_each(on_statement)
    }
    fn add_statement(&mut self, statement: &Statement) -> Result<()> {
        if let Statement::Program { name, parameters } = statement {
            self.blocks.push(Block::new(*name, parameters.clone()));
            self.current = Some(self.blocks.len() - 1);
            return Ok(());
        }
        let index = match self.current {
            Some(index) => index,
            None => {
                self.blocks.push(Block::new(Text::new("base"), vec![]));
                *self.current.insert(self.blocks.len() - 1)
            }
        };
        self.blocks[index].statements.push(statement.clone());
        Ok(())
    }
    fn ground(&mut self, parts: &[Part], observer: &mut dyn Observer) -> Result<()> {
        observer.begin_step()?;
        for part in parts {
            let name = Text::new(&part.name);
            let instances: Vec<Vec<Statement>> = self
                .blocks
                .iter()
                .filter(|block| block.name == name && block.params.len() == part.args.len())
                .map(|block| {
                    let assignment: HashMap<Text, Symbol> =
                        block.params.iter().copied().zip(part.args.iter().cloned()).collect();
                    block.statements.iter().map(|s| substitute_statement(s, &assignment)).collect()
                })
                .collect();
            if instances.is_empty() {
                return Err(Error::Engine(format!(
                    "no program part {}/{}",
                    part.name,
                    part.args.len()
                )));
            }
            debug!(part = %part.name, arity = part.args.len(), blocks = instances.len(), "grounding part");
            for statement in instances.iter().flatten() {
                self.ground_statement(statement, observer)?;
            }
        }
        self.flush_output(observer)?;
        observer.end_step()
    }
    fn backend<'a>(&'a mut self, observer: Box<dyn Observer + 'a>) -> Box<dyn Backend + 'a> {
        Box::new(PropositionalBackend { engine: self, observer })
    }
    fn symbolic_atoms(&self) -> Vec<SymbolicAtom> {
        let atoms = self.symbols.iter().enumerate();
        atoms
            .filter_map(|(i, symbol)| {
                let atom = i as Atom + 1;
                let symbol = symbol.clone()?;
                Some(SymbolicAtom { symbol, atom, is_fact: self.facts.contains(&atom) })
            })
            .collect()
    }
}

fn substitute_body(body: &[BodyLiteral], assignment: &HashMap<Text, Symbol>) -> Vec<BodyLiteral> {
    body.iter()
        .map(|element| match element {
            BodyLiteral::Literal { atom, positive } => {
                BodyLiteral::Literal { atom: substitute(atom, assignment), positive: *positive }
            }
            BodyLiteral::Sum { elements, lower } => {
                let mut elements = elements.clone();
                for e in elements.iter_mut() {
                    e.atom = substitute(&e.atom, assignment);
                }
                BodyLiteral::Sum { elements, lower: *lower }
            }
        })
        .collect()
}

fn substitute_statement(statement: &Statement, assignment: &HashMap<Text, Symbol>) -> Statement {
    let sub = |symbol: &Symbol| substitute(symbol, assignment);
    let sub_body = |body: &[BodyLiteral]| substitute_body(body, assignment);
    match statement {
        Statement::Rule { head, body } => Statement::Rule {
            head: match head {
                Head::Choice(atoms) => Head::Choice(atoms.iter().map(sub).collect()),
                Head::Disjunction(atoms) => Head::Disjunction(atoms.iter().map(sub).collect()),
            },
            body: sub_body(body),
        },
        Statement::Project(symbol) => Statement::Project(sub(symbol)),
        Statement::External(symbol) => Statement::External(sub(symbol)),
        Statement::ShowTerm { term, body } => {
            Statement::ShowTerm { term: sub(term), body: sub_body(body) }
        }
        Statement::Minimize(elements) => {
            let mut elements = elements.clone();
            for e in elements.iter_mut() {
                e.atom = sub(&e.atom);
            }
            Statement::Minimize(elements)
        }
        Statement::Heuristic { atom, body, bias, priority, kind } => Statement::Heuristic {
            atom: sub(atom),
            body: sub_body(body),
            bias: *bias,
            priority: *priority,
            kind: *kind,
        },
        Statement::Edge { u, v, body } => {
            Statement::Edge { u: sub(u), v: sub(v), body: sub_body(body) }
        }
        other => other.clone(),
    }
}

struct PropositionalBackend<'a> {
    engine: &'a mut PropositionalEngine,
    observer: Box<dyn Observer + 'a>,
}

impl Backend for PropositionalBackend<'_> {
    fn add_atom(&mut self, symbol: Option<&Symbol>) -> Result<Atom> {
        Ok(match symbol {
            Some(symbol) => self.engine.atom(symbol),
            None => self.engine.fresh_atom(None),
        })
    }
    fn add_rule(&mut self, choice: bool, head: &[Atom], body: &[i32]) -> Result<()> {
        self.observer.add_rule(choice, head, body)
    }
    fn add_weight_rule(
        &mut self,
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
    ) -> Result<()> {
        self.observer.add_weight_rule(choice, head, body, lower)
    }
    fn add_project(&mut self, atoms: &[Atom]) -> Result<()> {
        self.observer.add_project(atoms)
    }
    fn add_external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        self.observer.add_external(atom, value)
    }
    fn add_assume(&mut self, literals: &[i32]) -> Result<()> {
        self.observer.add_assume(literals)
    }
    fn add_heuristic(
        &mut self,
        atom: Atom,
        kind: HeuristicType,
        bias: Weight,
        priority: u32,
        condition: &[i32],
    ) -> Result<()> {
        self.observer.add_heuristic(atom, kind, bias, priority, condition)
    }
    fn add_minimize(&mut self, priority: Weight, literals: &[(i32, Weight)]) -> Result<()> {
        self.observer.add_minimize(priority, literals)
    }
    fn add_acyc_edge(&mut self, node_u: i32, node_v: i32, condition: &[i32]) -> Result<()> {
        self.observer.add_acyc_edge(node_u, node_v, condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroundObject, GroundProgram, GroundProgramObserver};

    fn ground(engine: &mut PropositionalEngine, parts: &[Part]) -> GroundProgram {
        let mut program = GroundProgram::default();
        engine.ground(parts, &mut GroundProgramObserver::new(&mut program, 1)).unwrap();
        program
    }

    #[test]
    fn facts_report_output_without_atom() {
        let mut engine = PropositionalEngine::new();
        engine.add("p", &["t"], "q(t).").unwrap();
        let program = ground(&mut engine, &[Part::new("p", vec![Symbol::number(1)])]);
        let q1 = Symbol::function("q", vec![Symbol::number(1)]);
        assert_eq!(
            program.objects(),
            [
                GroundObject::Rule(crate::Rule::new(false, &[1], &[], 1).unwrap()),
                GroundObject::OutputAtom(crate::OutputAtom { order: 1, symbol: q1, atom: 0 }),
            ]
        );
    }

    #[test]
    fn sums_become_weight_rules() {
        let mut engine = PropositionalEngine::new();
        engine.add("base", &[], "{a}. :- not a. {b}. c :- #sum{1:a; 2:b} >= 3.").unwrap();
        let program = ground(&mut engine, &[Part::base()]);
        let weight_rules: Vec<_> = program
            .iter()
            .filter_map(|object| match object {
                GroundObject::WeightRule(rule) => Some(rule),
                _ => None,
            })
            .collect();
        assert_eq!(weight_rules.len(), 1);
        assert_eq!(weight_rules[0].head, [3]);
        assert_eq!(weight_rules[0].lower, 3);
        assert_eq!(engine.symbol(4), Some(&Symbol::constant("c")));
        assert_eq!(engine.symbol(3), None);
    }

    #[test]
    fn shows_restrict_output() {
        let mut engine = PropositionalEngine::new();
        engine.add("base", &[], "{a}. {b}. #show b/0.").unwrap();
        let program = ground(&mut engine, &[Part::base()]);
        let outputs: Vec<_> = program
            .iter()
            .filter(|object| matches!(object, GroundObject::OutputAtom(_)))
            .collect();
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn unknown_parts_are_reported() {
        let mut engine = PropositionalEngine::new();
        engine.add("p", &["t"], "q(t).").unwrap();
        let mut program = GroundProgram::default();
        let err = engine
            .ground(&[Part::new("p", vec![])], &mut GroundProgramObserver::new(&mut program, 1))
            .unwrap_err();
        assert_eq!(err, Error::Engine("no program part p/0".into()));
    }

    #[test]
    fn known_facts_leave_bodies() {
        let mut engine = PropositionalEngine::new();
        engine.add("base", &[], "q. {p}. r :- q, p. s :- not q.").unwrap();
        let program = ground(&mut engine, &[Part::base()]);
        let rules: Vec<_> = program
            .iter()
            .filter_map(|object| match object {
                GroundObject::Rule(rule) => Some(rule.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            rules,
            [
                crate::Rule::new(false, &[1], &[], 1).unwrap(),
                crate::Rule::new(true, &[2], &[], 1).unwrap(),
                crate::Rule::new(false, &[3], &[2], 1).unwrap(),
                crate::Rule::new(false, &[4], &[-1], 1).unwrap(),
            ]
        );
    }

    #[test]
    fn directives_are_reported() {
        let mut engine = PropositionalEngine::new();
        let source = "{a; b}. #minimize{1:a; 2@1:b; 3@1:not a}. #heuristic a: b. [1@2, sign] \
                      #edge (a,b): a. #edge (b,a). #show a/0. #show (x,1): b.";
        engine.add("base", &[], source).unwrap();
        let program = ground(&mut engine, &[Part::base()]);
        let kinds: Vec<_> = program
            .iter()
            .map(|object| match object {
                GroundObject::Rule(_) => "rule",
                GroundObject::Minimize(m) if m.priority == 1 => "minimize@1",
                GroundObject::Minimize(_) => "minimize@0",
                GroundObject::Heuristic(_) => "heuristic",
                GroundObject::Edge(e) => if e.u == 0 { "edge a-b" } else { "edge b-a" },
                GroundObject::Show(_) => "show",
                GroundObject::OutputAtom(_) => "output",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            ["rule", "minimize@1", "minimize@0", "heuristic", "edge a-b", "edge b-a", "show", "output"]
        );
    }

    #[test]
    fn atom_base_marks_facts() {
        let mut engine = PropositionalEngine::new();
        engine.add("base", &[], "a. {b}. c :- #sum{1:b} >= 1.").unwrap();
        ground(&mut engine, &[Part::base()]);
        let atoms = engine.symbolic_atoms();
        let summary: Vec<_> =
            atoms.iter().map(|atom| (atom.symbol.to_string(), atom.atom, atom.is_fact)).collect();
        assert_eq!(
            summary,
            [("a".to_string(), 1, true), ("b".to_string(), 2, false), ("c".to_string(), 4, false)]
        );
    }

    #[test]
    fn regrounding_keeps_show_signatures_once() {
        let mut engine = PropositionalEngine::new();
        engine.add("base", &[], "{a}. {b}. #show b/0.").unwrap();
        for _ in 0..3 {
            ground(&mut engine, &[Part::base()]);
        }
        assert_eq!(engine.shows.len(), 1);
        assert!(engine.hide_unshown);
    }
}
