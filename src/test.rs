use crate::ast::Statement;
use crate::config::{Config, CONFIG};
use crate::propositional::PropositionalEngine;
use crate::*;
use std::collections::VecDeque;

const PROGRAM: &str = "
    {a}.
    {b}.
    c :- a.
    #project c.
";

fn grounded(source: &str) -> Controller<PropositionalEngine> {
    let mut controller = Controller::new(PropositionalEngine::new());
    controller.add("base", &[], source).unwrap();
    controller.ground(&[Part::base()]).unwrap();
    controller
}

fn squeeze(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn rule(choice: bool, head: &[Atom], body: &[i32], order: Epoch) -> GroundObject {
    Rule::new(choice, head, body, order).unwrap().into()
}

fn output(name: &str, atom: Atom, order: Epoch) -> GroundObject {
    OutputAtom { order, symbol: Symbol::constant(name), atom }.into()
}

/////////////////////

enum Event {
    Rule(bool, Vec<Atom>, Vec<i32>),
    WeightRule(Vec<Atom>, Vec<(i32, Weight)>, Weight),
    Output(Symbol, Atom),
    Assume(Vec<i32>),
}

/// Replays one scripted batch of backend events per `ground()` call.
#[derive(Default)]
struct ScriptedEngine {
    steps: VecDeque<Vec<Event>>,
    /// Statements starting with this text are refused by `add_statement`.
    rejects: Option<&'static str>,
}

struct ScriptedBackend<'a> {
    observer: Box<dyn Observer + 'a>,
    next_atom: Atom,
}

impl Engine for ScriptedEngine {
    fn add(&mut self, _name: &str, _params: &[&str], _text: &str) -> Result<()> {
        Ok(())
    }
    fn parse(&self, text: &str, on_statement: &mut dyn FnMut(Statement) -> Result<()>) -> Result<()> {
        parse::statements(text)?.into_iter().try_for_each(on_statement)
    }
    fn add_statement(&mut self, statement: &Statement) -> Result<()> {
        match self.rejects {
            Some(prefix) if statement.to_string().starts_with(prefix) => {
                Err(Error::Engine(format!("{prefix} is not supported")))
            }
            _ => Ok(()),
        }
    }
    fn ground(&mut self, _parts: &[Part], observer: &mut dyn Observer) -> Result<()> {
        for event in self.steps.pop_front().unwrap_or_default() {
            match event {
                Event::Rule(choice, head, body) => observer.add_rule(choice, &head, &body)?,
                Event::WeightRule(head, body, lower) => {
                    observer.add_weight_rule(false, &head, &body, lower)?
                }
                Event::Output(symbol, atom) => observer.add_output_atom(&symbol, atom)?,
                Event::Assume(literals) => observer.add_assume(&literals)?,
            }
        }
        Ok(())
    }
    fn backend<'a>(&'a mut self, observer: Box<dyn Observer + 'a>) -> Box<dyn Backend + 'a> {
        Box::new(ScriptedBackend { observer, next_atom: 100 })
    }
    fn symbolic_atoms(&self) -> Vec<SymbolicAtom> {
        vec![]
    }
}

impl Backend for ScriptedBackend<'_> {
    fn add_atom(&mut self, _symbol: Option<&Symbol>) -> Result<Atom> {
        self.next_atom += 1;
        Ok(self.next_atom)
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

fn scripted(steps: Vec<Vec<Event>>) -> Controller<ScriptedEngine> {
    Controller::new(ScriptedEngine { steps: steps.into(), rejects: None })
}

/////////////////////

#[test]
fn concrete_scenario() {
    let controller = grounded(PROGRAM);
    let mut expected = vec![
        rule(true, &[1], &[], 1),
        rule(true, &[2], &[], 1),
        rule(false, &[3], &[1], 1),
        Project::new(&[3], 1).unwrap().into(),
        output("a", 1, 1),
        output("b", 2, 1),
        output("c", 3, 1),
    ];
    expected.sort();
    assert_eq!(controller.ground_program().sorted_objects(), expected);
    assert_eq!(controller.epoch(), 1);
}

#[test]
fn round_trip_rendering() {
    let controller = grounded(PROGRAM);
    let rendered = controller.render().unwrap();
    assert_eq!(rendered, "{a}.\n{b}.\n\nc :- a.\n\n#project c.");
    assert_eq!(squeeze(&rendered), squeeze(PROGRAM));
    assert_eq!(controller.ground_program().to_string(), rendered);
}

#[test]
fn backend_rules_get_synthesized_names() {
    let mut controller = grounded(PROGRAM);
    {
        let mut backend = controller.backend();
        backend.add_rule(false, &[4], &[1]).unwrap();
    }
    let rendered = controller.render().unwrap();
    assert_eq!(rendered, "{a}.\n{b}.\n\nc :- a.\nx_4 :- a.\n\n#project c.");
    assert!(controller.ground_program().iter().any(|object| *object == rule(false, &[4], &[1], 1)));
}

#[test]
fn backend_facts_over_unlabeled_atoms_are_suppressed() {
    let mut controller = grounded(PROGRAM);
    controller.backend().add_rule(false, &[4], &[]).unwrap();
    assert_eq!(controller.ground_program().len(), 8);
    assert_eq!(squeeze(&controller.render().unwrap()), squeeze(PROGRAM));
}

#[test]
fn duplicate_additions_are_preserved() {
    let mut controller = grounded(PROGRAM);
    let before = controller.ground_program().len();
    {
        let mut backend = controller.backend();
        backend.add_rule(false, &[3], &[1]).unwrap();
        backend.add_rule(false, &[3], &[1]).unwrap();
    }
    let program = controller.ground_program();
    assert_eq!(program.len(), before + 2);
    let copies = program.iter().filter(|object| **object == rule(false, &[3], &[1], 1)).count();
    assert_eq!(copies, 3);
}

#[test]
fn symbolic_backend_adds_by_symbol() {
    let mut controller = grounded(PROGRAM);
    {
        let mut backend = controller.backend();
        let mut symbolic = SymbolicBackend::new(backend.as_mut());
        let [a, b, d] = ["a", "b", "d"].map(Symbol::constant);
        symbolic.add_rule(&[d.clone()], &[a], &[b], false).unwrap();
        symbolic.add_project(&[d]).unwrap();
    }
    // `d` is new to the engine and never got an output atom
    let rendered = controller.render().unwrap();
    assert_eq!(
        rendered,
        "{a}.\n{b}.\n\nc :- a.\nx_4 :- a, not b.\n\n#project c.\n#project x_4."
    );
}

#[test]
fn weight_rules_stay_whole() {
    let controller = grounded("{a}. :- not a. {b}. c :- #sum{1:a; 2:b} >= 3.");
    let program = controller.ground_program();
    let weight_rule = WeightRule::new(false, &[3], &[(1, 1), (2, 2)], 3, 1).unwrap();
    let matching: Vec<_> = program
        .iter()
        .filter(|object| matches!(object, GroundObject::WeightRule(_)))
        .collect();
    assert_eq!(matching, [&GroundObject::WeightRule(weight_rule)]);
    assert!(program.iter().any(|object| *object == rule(false, &[4], &[3], 1)));
    assert_eq!(
        controller.render().unwrap(),
        "{a}.\n{b}.\n\n:- not a.\nc :- x_3.\n\nx_3 :- #sum{1,0: a; 2,1: b} >= 3."
    );
}

#[test]
fn epochs_increase_per_ground_call() {
    let mut controller = Controller::new(PropositionalEngine::new());
    controller.add("p", &["t"], "q(t).").unwrap();
    for k in 1..=3 {
        controller.ground(&[Part::new("p", vec![Symbol::number(1)])]).unwrap();
        assert_eq!(controller.epoch(), k);
    }
    let program = controller.ground_program();
    let rules: Vec<_> = program
        .iter()
        .filter_map(|object| match object {
            GroundObject::Rule(rule) => Some(rule),
            _ => None,
        })
        .collect();
    assert_eq!(rules.iter().map(|rule| rule.order).collect::<Vec<_>>(), [1, 2, 3]);
    // same ground rule, different passes
    assert!(rules.iter().all(|rule| rule.head == [1] && rule.body.is_empty()));
    assert_ne!(rules[0], rules[1]);
    assert_ne!(rules[1], rules[2]);
}

#[test]
fn several_parts_share_one_epoch() {
    let mut controller = Controller::with_config(
        PropositionalEngine::new(),
        Config { base_epoch: 10, ..CONFIG },
    );
    controller.add("p", &["t"], "q(t).").unwrap();
    controller
        .ground(&[Part::new("p", vec![Symbol::number(1)]), Part::new("p", vec![Symbol::number(2)])])
        .unwrap();
    let program = controller.ground_program();
    assert_eq!(program.len(), 4);
    assert!(program.iter().all(|object| object.order() == 11));
    assert_eq!(program.render().unwrap(), "q(1).\nq(2).");
}

#[test]
fn engine_misuse_is_reported_and_epoch_kept() {
    let mut controller = Controller::new(PropositionalEngine::new());
    let err = controller.ground(&[Part::new("missing", vec![])]).unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
    assert_eq!(controller.epoch(), 1);
    assert!(controller.ground_program().is_empty());
}

#[test]
fn malformed_events_propagate_without_rollback() {
    let mut controller = scripted(vec![vec![
        Event::Rule(true, vec![1], vec![]),
        Event::Rule(false, vec![2], vec![0]),
        Event::Rule(false, vec![3], vec![]),
    ]]);
    let err = controller.ground(&[Part::base()]).unwrap_err();
    assert!(matches!(err, Error::MalformedEvent(_)));
    assert_eq!(controller.ground_program().objects(), [rule(true, &[1], &[], 1)]);
}

#[test]
fn negative_weights_are_rejected() {
    let mut controller = scripted(vec![vec![Event::WeightRule(vec![1], vec![(2, -1)], 0)]]);
    assert!(matches!(controller.ground(&[Part::base()]), Err(Error::MalformedEvent(_))));
}

#[test]
fn only_latest_assumptions_are_rendered() {
    let mut controller = scripted(vec![
        vec![Event::Assume(vec![1]), Event::Rule(false, vec![1], vec![])],
        vec![Event::Assume(vec![-1]), Event::Output(Symbol::constant("a"), 1)],
    ]);
    controller.ground(&[Part::base()]).unwrap();
    controller.ground(&[Part::base()]).unwrap();
    let program = controller.ground_program();
    assert_eq!(
        program.objects(),
        [
            Assume::new(&[1], 1).unwrap().into(),
            rule(false, &[1], &[], 1),
            Assume::new(&[-1], 2).unwrap().into(),
            output("a", 1, 2),
        ]
    );
    assert_eq!(program.render().unwrap(), "a.\n\n% assumptions: not a");
}

#[test]
fn sorting_is_a_stable_total_order() {
    let mut objects = vec![
        output("b", 2, 1),
        rule(false, &[3], &[1], 2),
        WeightRule::new(true, &[4], &[(1, 2)], 1, 1).unwrap().into(),
        Project::new(&[3], 1).unwrap().into(),
        rule(false, &[3], &[1], 1),
        rule(true, &[3], &[1], 1),
        External::new(5, TruthValue::Free, 1).unwrap().into(),
        output("a", 2, 1),
        rule(false, &[2], &[-1], 1),
    ];
    let mut first = objects.clone();
    first.sort();
    objects.reverse();
    objects.rotate_left(4);
    objects.sort();
    assert_eq!(first, objects);

    for (i, x) in first.iter().enumerate() {
        for (j, y) in first.iter().enumerate() {
            assert_eq!(x.cmp(y), i.cmp(&j), "{x:?} vs {y:?}");
            assert_eq!(x.cmp(y), y.cmp(x).reverse());
        }
    }
    assert!(matches!(first[0], GroundObject::Rule(Rule { order: 1, .. })));
    assert!(matches!(first.last(), Some(GroundObject::External(_))));
}

#[test]
fn synthesized_names_avoid_real_symbols() {
    let mut program = GroundProgram::default();
    program.add_output_atom(Symbol::constant("x_2"), 1, 1);
    program.add_rule(false, &[2], &[1], 1).unwrap();
    program.add_rule(false, &[3], &[2], 1).unwrap();
    assert_eq!(program.render().unwrap(), "x_3 :- x_2.\nx_4 :- x_3.");
    assert_eq!(program.render_with_prefix("aux").unwrap(), "aux2 :- x_2.\naux3 :- aux2.");
}

#[test]
fn earliest_output_atom_names_an_atom() {
    let mut program = GroundProgram::default();
    program.add_output_atom(Symbol::constant("late"), 1, 2);
    program.add_output_atom(Symbol::constant("early"), 1, 1);
    program.add_rule(true, &[1], &[], 1).unwrap();
    assert_eq!(program.render().unwrap(), "{early}.");
}

#[test]
fn renders_remaining_constructs() {
    let mut program = GroundProgram::default();
    program.add_output_atom(Symbol::constant("a"), 1, 1);
    program.add_output_atom(Symbol::constant("b"), 2, 1);
    program.add_output_atom(Symbol::constant("f"), 0, 1);
    program.add_rule(false, &[1, 2], &[], 1).unwrap();
    program.add_rule(true, &[1, 2], &[-1], 1).unwrap();
    program.add_rule(false, &[], &[], 1).unwrap();
    program.add_project(&[], 1).unwrap();
    program.append(External::new(2, TruthValue::True, 1).unwrap());
    assert_eq!(
        program.render().unwrap(),
        "f.\n\n#false.\na; b.\n\n{a; b} :- not a.\n\n#external b. [true]\n\n#project."
    );
}

#[test]
fn malformed_contents_are_unrenderable() {
    let program = GroundProgram::new([GroundObject::Rule(Rule {
        order: 1,
        head: vec![0],
        body: vec![],
        choice: false,
    })]);
    assert!(matches!(program.render(), Err(Error::Unrenderable(_))));
    let program = GroundProgram::new([GroundObject::WeightRule(WeightRule {
        order: 1,
        head: vec![1],
        body: vec![(Literal::positive(2).unwrap(), -4)],
        lower: 1,
        choice: false,
    })]);
    assert!(matches!(program.render(), Err(Error::Unrenderable(_))));
}

#[test]
fn parsed_program_gets_implicit_base_header() {
    let mut controller = Controller::new(PropositionalEngine::new());
    controller.add_program("#program p(t).\nq(t).").unwrap();
    let parsed: Vec<String> = controller.parsed_program().iter().map(ToString::to_string).collect();
    assert_eq!(parsed, ["#program base.", "#program p(t).", "q(t)."]);
    assert!(controller.ground_program().is_empty());
    assert_eq!(controller.epoch(), 0);

    controller
        .ground(&[Part::new("p", vec![Symbol::number(1)]), Part::new("p", vec![Symbol::number(2)])])
        .unwrap();
    assert_eq!(controller.render().unwrap(), "q(1).\nq(2).");
}

#[test]
fn explicit_base_header_is_not_doubled() {
    let mut controller = Controller::new(PropositionalEngine::new());
    controller.add_program("#program base.\na.").unwrap();
    controller.add_program("").unwrap();
    let parsed: Vec<String> = controller.parsed_program().iter().map(ToString::to_string).collect();
    assert_eq!(parsed, ["#program base.", "a.", "#program base."]);
}

#[test]
fn builder_records_and_forwards_statements() {
    let mut controller = Controller::new(PropositionalEngine::new());
    {
        let mut builder = controller.builder();
        for statement in parse::statements("#show b/0. {a}. {b}.").unwrap() {
            builder.add(statement).unwrap();
        }
        builder.finish().unwrap();
    }
    assert_eq!(controller.parsed_program().len(), 4);
    controller.ground(&[Part::base()]).unwrap();
    // only `b` is shown, `a` keeps a made-up name
    assert_eq!(controller.render().unwrap(), "{b}.\n{x_1}.");
}

#[test]
fn facts_used_in_bodies_stay_defined() {
    // the engine drops a known fact from the body
    let controller = grounded("q. r :- q.");
    assert_eq!(controller.render().unwrap(), "q.\nr.");

    // a fact seen after its use keeps a made-up name, defined by its rule
    let controller = grounded("r :- q. q. s :- not q.");
    assert_eq!(controller.render().unwrap(), "q.\nx_1.\n\nr :- x_1.\ns :- not x_1.");
}

#[test]
fn referenced_unlabeled_facts_are_rendered() {
    let mut program = GroundProgram::default();
    program.add_rule(false, &[1], &[], 1).unwrap();
    program.add_output_atom(Symbol::constant("q"), 0, 1);
    program.add_rule(false, &[2], &[-1], 1).unwrap();
    program.add_output_atom(Symbol::constant("r"), 2, 1);
    program.add_rule(false, &[3], &[], 1).unwrap();
    assert_eq!(program.render().unwrap(), "q.\nx_1.\n\nr :- not x_1.");
}

#[test]
fn display_reports_unrenderable_contents() {
    let program = GroundProgram::new([GroundObject::Rule(Rule {
        order: 1,
        head: vec![0],
        body: vec![],
        choice: false,
    })]);
    let shown = program.to_string();
    assert!(shown.starts_with("% Unrenderable ground program:"), "{shown}");
    assert_eq!(format!("{program}"), shown);
}

#[test]
fn renders_directives() {
    let controller = grounded(
        "{a; b}. #show a/0. #show (x,1): b. #minimize{1:a; 2@1:not b}. \
         #heuristic a: b. [1@2, sign] #edge (a,b): a.",
    );
    assert_eq!(
        controller.render().unwrap(),
        "#show (x,1): x_2.\n\n\
         {a; x_2}.\n\n\
         #heuristic a: x_2. [1@2, sign]\n\n\
         #edge (0,1): a.\n\n\
         #minimize{1@0,0: a}.\n#minimize{2@1,0: not x_2}."
    );
}

#[test]
fn symbolic_backend_adds_directives() {
    let mut controller = grounded(PROGRAM);
    {
        let mut backend = controller.backend();
        let mut symbolic = SymbolicBackend::new(backend.as_mut());
        let [a, b, c] = ["a", "b", "c"].map(Symbol::constant);
        symbolic.add_assume(&[a.clone()]).unwrap();
        symbolic.add_minimize(0, &[(c.clone(), 2)], &[(b.clone(), 1)]).unwrap();
        symbolic.add_heuristic(&c, HeuristicType::True, 3, 1, &[a.clone()], &[]).unwrap();
        symbolic.add_acyc_edge(0, 1, &[], &[b]).unwrap();
    }
    let rendered = controller.render().unwrap();
    assert!(rendered.ends_with(
        "#heuristic c: a. [3@1, true]\n\n\
         #edge (0,1): not b.\n\n\
         #minimize{2@0,0: c; 1@0,1: not b}.\n\n\
         #project c.\n\n\
         % assumptions: a"
    ));
}

#[test]
fn atom_base_is_exposed() {
    let controller = grounded("q. {p}. r :- p.");
    assert_eq!(controller.facts(), [Symbol::constant("q")]);
    let mapping: Vec<_> = controller.atom_to_symbol_mapping().into_iter().collect();
    assert_eq!(mapping, [(2, Symbol::constant("p")), (3, Symbol::constant("r"))]);
}

#[test]
fn statement_errors_name_the_statement() {
    let engine = ScriptedEngine { steps: VecDeque::new(), rejects: Some("#external") };
    let mut controller = Controller::new(engine);
    let err = controller.add_program("a.\n#external e.").unwrap_err();
    match &err {
        Error::Statement { statement, source } => {
            assert_eq!(statement, "#external e.");
            assert!(matches!(**source, Error::Engine(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().ends_with("in statement: #external e."));
    // recorded before the engine saw it
    assert_eq!(controller.parsed_program().len(), 3);
}

#[test]
fn epoch_overflow_is_an_error() {
    let config = Config { base_epoch: Epoch::MAX, ..CONFIG };
    let mut controller = Controller::with_config(PropositionalEngine::new(), config);
    controller.add("base", &[], "a.").unwrap();
    assert!(matches!(controller.ground(&[Part::base()]), Err(Error::Engine(_))));
    assert_eq!(controller.epoch(), Epoch::MAX);
    assert!(controller.ground_program().is_empty());
}
