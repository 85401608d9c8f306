use crate::entity::{GroundObject, OutputAtom, Project, Rule, WeightRule};
use crate::{pretty, Atom, Epoch, Result, Symbol, Weight};
use core::fmt::{Display, Formatter, Result as FmtResult};

/// Append-only collection of ground program entities in arrival order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroundProgram {
    objects: Vec<GroundObject>,
}

impl GroundProgram {
    pub fn new(objects: impl IntoIterator<Item = GroundObject>) -> Self {
        Self { objects: objects.into_iter().collect() }
    }
    pub fn append(&mut self, object: impl Into<GroundObject>) {
        self.objects.push(object.into())
    }
    pub fn add_rule(&mut self, choice: bool, head: &[Atom], body: &[i32], order: Epoch) -> Result<()> {
        self.append(Rule::new(choice, head, body, order)?);
        Ok(())
    }
    pub fn add_weight_rule(
        &mut self,
        choice: bool,
        head: &[Atom],
        body: &[(i32, Weight)],
        lower: Weight,
        order: Epoch,
    ) -> Result<()> {
        self.append(WeightRule::new(choice, head, body, lower, order)?);
        Ok(())
    }
    pub fn add_project(&mut self, atoms: &[Atom], order: Epoch) -> Result<()> {
        self.append(Project::new(atoms, order)?);
        Ok(())
    }
    pub fn add_output_atom(&mut self, symbol: Symbol, atom: Atom, order: Epoch) {
        self.append(OutputAtom { order, symbol, atom })
    }
    pub fn objects(&self) -> &[GroundObject] {
        &self.objects
    }
    pub fn iter(&self) -> impl Iterator<Item = &GroundObject> {
        self.objects.iter()
    }
    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
    /// Entities in kind, epoch, then field order.
    pub fn sorted_objects(&self) -> Vec<GroundObject> {
        let mut objects = self.objects.clone();
        objects.sort();
        objects
    }
    pub fn render(&self) -> Result<String> {
        self.render_with_prefix(crate::config::CONFIG.synthesized_prefix)
    }
    pub fn render_with_prefix(&self, synthesized_prefix: &str) -> Result<String> {
        pretty::render(&self.objects, synthesized_prefix)
    }
}

impl Extend<GroundObject> for GroundProgram {
    fn extend<I: IntoIterator<Item = GroundObject>>(&mut self, iter: I) {
        self.objects.extend(iter)
    }
}

impl FromIterator<GroundObject> for GroundProgram {
    fn from_iter<I: IntoIterator<Item = GroundObject>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a GroundProgram {
    type Item = &'a GroundObject;
    type IntoIter = std::slice::Iter<'a, GroundObject>;
    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// Renders the program, or a `%` comment naming the problem when the
/// contents cannot be rendered. Use [`GroundProgram::render`] to get the error.
impl Display for GroundProgram {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "% {err}"),
        }
    }
}
