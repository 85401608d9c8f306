use crate::entity::{
    Edge, External, GroundObject, Heuristic, Minimize, OutputAtom, Project, Rule, Show, WeightRule,
};
use crate::{Atom, Error, Literal, Result, Symbol};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Display name of an atom: its output symbol, or a made-up name.
enum Name<'a> {
    Symbol(&'a Symbol),
    Synthesized(String),
}

#[derive(Default)]
pub(crate) struct NameTable<'a> {
    names: HashMap<Atom, Name<'a>>,
}

pub(crate) struct Pretty<'a, T> {
    pub(crate) t: &'a T,
    pub(crate) names: &'a NameTable<'a>,
}

impl Display for Name<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Synthesized(name) => f.write_str(name),
        }
    }
}

impl<'a> NameTable<'a> {
    /// Every atom referenced by `objects` gets a name. Atoms with several
    /// output atoms take the smallest one, so the earliest epoch wins.
    pub(crate) fn new(objects: &'a [GroundObject], synthesized_prefix: &str) -> Self {
        let mut labels: BTreeMap<Atom, &'a OutputAtom> = BTreeMap::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut referenced: BTreeSet<Atom> = BTreeSet::new();
        for object in objects {
            if let GroundObject::OutputAtom(output) = object {
                taken.insert(output.symbol.to_string());
                if output.atom != 0 {
                    let label = labels.entry(output.atom).or_insert(output);
                    if output < *label {
                        *label = output;
                    }
                }
            }
            object.visit_atoms(&mut |atom| {
                referenced.insert(atom);
            });
        }

        let mut table = Self::default();
        for atom in referenced {
            let name = match labels.get(&atom) {
                Some(&output) => Name::Symbol(&output.symbol),
                None => {
                    // stable per atom id, bumped past names already in use
                    let mut i = u64::from(atom);
                    let name = loop {
                        let name = format!("{synthesized_prefix}{i}");
                        if !taken.contains(&name) {
                            break name;
                        }
                        i += 1;
                    };
                    taken.insert(name.clone());
                    Name::Synthesized(name)
                }
            };
            table.names.insert(atom, name);
        }
        table
    }
    fn name(&self, atom: Atom) -> &Name<'a> {
        // every referenced atom is named in `new`
        &self.names[&atom]
    }
    fn symbol(&self, atom: Atom) -> Option<&'a Symbol> {
        match self.names.get(&atom) {
            Some(Name::Symbol(symbol)) => Some(*symbol),
            _ => None,
        }
    }
    fn pretty<'b, T>(&'b self, t: &'b T) -> Pretty<'b, T> {
        Pretty { t, names: self }
    }
}

/////////////////////

/// Writes the head and returns whether anything was written.
fn write_head(f: &mut Formatter<'_>, names: &NameTable, choice: bool, head: &[Atom]) -> std::result::Result<bool, std::fmt::Error> {
    if choice {
        write!(f, "{{")?;
    }
    for (i, &atom) in head.iter().enumerate() {
        if i > 0 {
            write!(f, "; ")?;
        }
        write!(f, "{}", names.name(atom))?;
    }
    if choice {
        write!(f, "}}")?;
    }
    Ok(choice || !head.is_empty())
}

/// Writes `: l1, l2` for a non-empty condition.
fn write_condition(f: &mut Formatter<'_>, names: &NameTable, condition: &[Literal]) -> FmtResult {
    for (i, lit) in condition.iter().enumerate() {
        write!(f, "{}{}", if i == 0 { ": " } else { ", " }, names.pretty(lit))?;
    }
    Ok(())
}

fn write_turnstile(f: &mut Formatter<'_>, after_head: bool) -> FmtResult {
    if after_head {
        write!(f, " :- ")
    } else {
        write!(f, ":- ")
    }
}

impl Display for Pretty<'_, Literal> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if !self.t.is_positive() {
            write!(f, "not ")?;
        }
        write!(f, "{}", self.names.name(self.t.atom()))
    }
}

impl Display for Pretty<'_, Rule> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let Rule { choice, head, body, .. } = self.t;
        if !choice && head.is_empty() && body.is_empty() {
            return write!(f, "#false.");
        }
        let after_head = write_head(f, self.names, *choice, head)?;
        if body.is_empty() {
            return write!(f, ".");
        }
        write_turnstile(f, after_head)?;
        for (i, lit) in body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.names.pretty(lit))?;
        }
        write!(f, ".")
    }
}

impl Display for Pretty<'_, WeightRule> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let WeightRule { choice, head, body, lower, .. } = self.t;
        let after_head = write_head(f, self.names, *choice, head)?;
        write_turnstile(f, after_head)?;
        write!(f, "#sum{{")?;
        for (i, (lit, weight)) in body.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{weight},{i}: {}", self.names.pretty(lit))?;
        }
        write!(f, "}} >= {lower}.")
    }
}

impl Display for Pretty<'_, Project> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut names: Vec<String> =
            self.t.atoms.iter().map(|&atom| self.names.name(atom).to_string()).collect();
        names.sort();
        names.dedup();
        if names.is_empty() {
            return write!(f, "#project.");
        }
        write!(f, "#project {}.", names.join(", "))
    }
}

impl Display for Pretty<'_, External> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#external {}. [{}]", self.names.name(self.t.atom), self.t.value.as_str())
    }
}

impl Display for Pretty<'_, Show> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#show {}", self.t.symbol)?;
        write_condition(f, self.names, &self.t.condition)?;
        write!(f, ".")
    }
}

impl Display for Pretty<'_, Minimize> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#minimize{{")?;
        for (i, (lit, weight)) in self.t.literals.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{weight}@{},{i}: {}", self.t.priority, self.names.pretty(lit))?;
        }
        write!(f, "}}.")
    }
}

impl Display for Pretty<'_, Heuristic> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let Heuristic { atom, kind, bias, priority, condition, .. } = self.t;
        write!(f, "#heuristic {}", self.names.name(*atom))?;
        write_condition(f, self.names, condition)?;
        write!(f, ". [{bias}@{priority}, {}]", kind.as_str())
    }
}

impl Display for Pretty<'_, Edge> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#edge ({},{})", self.t.u, self.t.v)?;
        write_condition(f, self.names, &self.t.condition)?;
        write!(f, ".")
    }
}

/////////////////////

fn check_renderable(object: &GroundObject) -> Result<()> {
    let fail = |msg: String| -> Result<()> { Err(Error::Unrenderable(msg)) };
    match object {
        GroundObject::Rule(rule) if rule.head.contains(&0) => {
            fail(format!("rule {rule:?} has atom 0 in its head"))
        }
        GroundObject::WeightRule(rule) if rule.head.contains(&0) => {
            fail(format!("weight rule {rule:?} has atom 0 in its head"))
        }
        GroundObject::WeightRule(rule) if rule.lower < 0 => {
            fail(format!("weight rule {rule:?} has a negative lower bound"))
        }
        GroundObject::WeightRule(rule) if rule.body.iter().any(|&(_, weight)| weight < 0) => {
            fail(format!("weight rule {rule:?} has a negative weight"))
        }
        GroundObject::Project(project) if project.atoms.contains(&0) => {
            fail(format!("project {project:?} contains atom 0"))
        }
        GroundObject::External(external) if external.atom == 0 => {
            fail(format!("external {external:?} refers to atom 0"))
        }
        GroundObject::Heuristic(heuristic) if heuristic.atom == 0 => {
            fail(format!("heuristic {heuristic:?} refers to atom 0"))
        }
        _ => Ok(()),
    }
}

/// Renders ground program entities back into surface syntax.
///
/// Sections appear in a fixed order, separated by blank lines, each sorted:
/// shows, facts, choice facts, bodiless disjunctions, rules, weight rules,
/// heuristics, edges, minimize statements, externals, projections and the
/// assumptions of the latest epoch that has any. A bodiless normal rule over
/// an atom without an output symbol is left out unless another entity refers
/// to that atom; its output atom already shows the fact.
pub(crate) fn render(objects: &[GroundObject], synthesized_prefix: &str) -> Result<String> {
    for object in objects {
        check_renderable(object)?;
    }
    let names = NameTable::new(objects, synthesized_prefix);
    let mut used: HashSet<Atom> = HashSet::new();
    for object in objects {
        match object {
            GroundObject::Rule(rule) if rule.is_fact() => {}
            object => object.visit_atoms(&mut |atom| {
                used.insert(atom);
            }),
        }
    }
    let latest_assumptions = objects
        .iter()
        .filter_map(|object| match object {
            GroundObject::Assume(assume) => Some(assume.order),
            _ => None,
        })
        .max();

    let mut facts: BTreeSet<String> = BTreeSet::new();
    let mut shows = vec![];
    let mut choice_facts = vec![];
    let mut disjunctive_facts = vec![];
    let mut rules = vec![];
    let mut weight_rules = vec![];
    let mut heuristics = vec![];
    let mut edges = vec![];
    let mut minimizes = vec![];
    let mut externals = vec![];
    let mut projects = vec![];
    let mut assumptions = vec![];
    for object in objects {
        match object {
            GroundObject::OutputAtom(output) if output.atom == 0 => {
                facts.insert(format!("{}.", output.symbol));
            }
            GroundObject::OutputAtom(_) => {}
            GroundObject::Rule(rule) if rule.is_fact() => match names.symbol(rule.head[0]) {
                Some(symbol) => {
                    facts.insert(format!("{symbol}."));
                }
                None if used.contains(&rule.head[0]) => {
                    facts.insert(names.pretty(rule).to_string());
                }
                None => {}
            },
            GroundObject::Rule(rule) if rule.body.is_empty() && rule.choice && rule.head.len() == 1 => {
                choice_facts.push(names.pretty(rule).to_string())
            }
            GroundObject::Rule(rule) if rule.body.is_empty() => {
                disjunctive_facts.push(names.pretty(rule).to_string())
            }
            GroundObject::Rule(rule) => rules.push(names.pretty(rule).to_string()),
            GroundObject::WeightRule(rule) => weight_rules.push(names.pretty(rule).to_string()),
            GroundObject::External(external) => externals.push(names.pretty(external).to_string()),
            GroundObject::Project(project) => projects.push(names.pretty(project).to_string()),
            GroundObject::Show(show) => shows.push(names.pretty(show).to_string()),
            GroundObject::Minimize(minimize) => minimizes.push(names.pretty(minimize).to_string()),
            GroundObject::Heuristic(heuristic) => heuristics.push(names.pretty(heuristic).to_string()),
            GroundObject::Edge(edge) => edges.push(names.pretty(edge).to_string()),
            GroundObject::Assume(assume) if Some(assume.order) == latest_assumptions => {
                assumptions.extend(assume.literals.iter().map(|lit| names.pretty(lit).to_string()))
            }
            GroundObject::Assume(_) => {}
        }
    }
    let assumptions = if assumptions.is_empty() {
        vec![]
    } else {
        assumptions.sort();
        vec![format!("% assumptions: {}", assumptions.join(", "))]
    };

    let sections = [
        shows,
        facts.into_iter().collect(),
        choice_facts,
        disjunctive_facts,
        rules,
        weight_rules,
        heuristics,
        edges,
        minimizes,
        externals,
        projects,
        assumptions,
    ];
    let rendered: Vec<String> = sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .map(|mut section| {
            section.sort();
            section.join("\n")
        })
        .collect();
    Ok(rendered.join("\n\n"))
}
