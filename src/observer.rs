use crate::entity::{
    Assume, Edge, External, Heuristic, Minimize, OutputAtom, Project, Rule, Show, WeightRule,
};
use crate::{Atom, Epoch, GroundProgram, HeuristicType, Result, Symbol, TruthValue, Weight};
use tracing::trace;

/// Backend events as an engine reports them while grounding.
///
/// The four program-building events are required. The remaining ones have
/// provided methods acknowledging the event, so an observer only needs to
/// override what it represents.
pub trait Observer {
    fn add_rule(&mut self, choice: bool, head: &[Atom], body: &[i32]) -> Result<()>;
    fn add_weight_rule(
        &mut self,
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
    ) -> Result<()>;
    fn add_project(&mut self, atoms: &[Atom]) -> Result<()>;
    fn add_output_atom(&mut self, symbol: &Symbol, atom: Atom) -> Result<()>;

    fn add_output_term(&mut self, _symbol: &Symbol, _condition: &[i32]) -> Result<()> {
        Ok(())
    }
    fn add_external(&mut self, _atom: Atom, _value: TruthValue) -> Result<()> {
        Ok(())
    }
    fn add_assume(&mut self, _literals: &[i32]) -> Result<()> {
        Ok(())
    }
    fn add_minimize(&mut self, _priority: Weight, _literals: &[(i32, Weight)]) -> Result<()> {
        Ok(())
    }
    fn add_heuristic(
        &mut self,
        _atom: Atom,
        _kind: HeuristicType,
        _bias: Weight,
        _priority: u32,
        _condition: &[i32],
    ) -> Result<()> {
        Ok(())
    }
    fn add_acyc_edge(&mut self, _node_u: i32, _node_v: i32, _condition: &[i32]) -> Result<()> {
        Ok(())
    }
    fn begin_step(&mut self) -> Result<()> {
        Ok(())
    }
    fn end_step(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Mirrors backend events into a [`GroundProgram`], stamping every entity
/// with the epoch it was created in.
pub struct GroundProgramObserver<'a> {
    program: &'a mut GroundProgram,
    epoch: Epoch,
}

impl<'a> GroundProgramObserver<'a> {
    pub fn new(program: &'a mut GroundProgram, epoch: Epoch) -> Self {
        Self { program, epoch }
    }
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl Observer for GroundProgramObserver<'_> {
    fn add_rule(&mut self, choice: bool, head: &[Atom], body: &[i32]) -> Result<()> {
        trace!(choice, ?head, ?body, epoch = self.epoch, "rule");
        self.program.append(Rule::new(choice, head, body, self.epoch)?);
        Ok(())
    }
    fn add_weight_rule(
        &mut self,
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
    ) -> Result<()> {
        trace!(choice, ?head, ?body, lower, epoch = self.epoch, "weight rule");
        self.program.append(WeightRule::new(choice, head, body, lower, self.epoch)?);
        Ok(())
    }
    fn add_project(&mut self, atoms: &[Atom]) -> Result<()> {
        trace!(?atoms, epoch = self.epoch, "project");
        self.program.append(Project::new(atoms, self.epoch)?);
        Ok(())
    }
    fn add_output_atom(&mut self, symbol: &Symbol, atom: Atom) -> Result<()> {
        trace!(%symbol, atom, epoch = self.epoch, "output atom");
        self.program.append(OutputAtom { order: self.epoch, symbol: symbol.clone(), atom });
        Ok(())
    }
    fn add_output_term(&mut self, symbol: &Symbol, condition: &[i32]) -> Result<()> {
        trace!(%symbol, ?condition, epoch = self.epoch, "output term");
        self.program.append(Show::new(symbol.clone(), condition, self.epoch)?);
        Ok(())
    }
    fn add_external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        trace!(atom, ?value, epoch = self.epoch, "external");
        self.program.append(External::new(atom, value, self.epoch)?);
        Ok(())
    }
    fn add_assume(&mut self, literals: &[i32]) -> Result<()> {
        trace!(?literals, epoch = self.epoch, "assume");
        self.program.append(Assume::new(literals, self.epoch)?);
        Ok(())
    }
    fn add_minimize(&mut self, priority: Weight, literals: &[(i32, Weight)]) -> Result<()> {
        trace!(priority, ?literals, epoch = self.epoch, "minimize");
        self.program.append(Minimize::new(priority, literals, self.epoch)?);
        Ok(())
    }
    fn add_heuristic(
        &mut self,
        atom: Atom,
        kind: HeuristicType,
        bias: Weight,
        priority: u32,
        condition: &[i32],
    ) -> Result<()> {
        trace!(atom, ?kind, bias, priority, ?condition, epoch = self.epoch, "heuristic");
        self.program.append(Heuristic::new(atom, kind, bias, priority, condition, self.epoch)?);
        Ok(())
    }
    fn add_acyc_edge(&mut self, node_u: i32, node_v: i32, condition: &[i32]) -> Result<()> {
        trace!(node_u, node_v, ?condition, epoch = self.epoch, "acyclicity edge");
        self.program.append(Edge::new(node_u, node_v, condition, self.epoch)?);
        Ok(())
    }
}
