use crate::ast::Statement;
use crate::config::{Config, CONFIG};
use crate::engine::{Backend, Engine, Part};
use crate::{Atom, Epoch, Error, GroundProgram, GroundProgramObserver, Result, Symbol};
use std::collections::BTreeMap;
use tracing::debug;

/// Receives top-level statements as they are parsed.
pub trait AstBuilder {
    fn add(&mut self, statement: Statement) -> Result<()>;
}

/// Wraps an engine, recording its ground output per epoch and the parsed
/// statements fed to it.
///
/// The epoch is bumped exactly once per [`Controller::ground`] call, before
/// the engine runs. Everything the engine reports during that call carries
/// the new epoch; backend additions made afterwards carry it as well.
pub struct Controller<E> {
    engine: E,
    config: Config,
    epoch: Epoch,
    ground_program: GroundProgram,
    parsed_program: Vec<Statement>,
}

/// Records statements into the parsed program and forwards them to the engine.
pub struct ProgramBuilder<'a, E> {
    engine: &'a mut E,
    parsed: &'a mut Vec<Statement>,
    started: bool,
}

impl<E: Engine> Controller<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, CONFIG)
    }
    pub fn with_config(engine: E, config: Config) -> Self {
        Self {
            engine,
            config,
            epoch: config.base_epoch,
            ground_program: GroundProgram::default(),
            parsed_program: vec![],
        }
    }
    pub fn add(&mut self, name: &str, params: &[&str], text: &str) -> Result<()> {
        self.engine.add(name, params, text)
    }
    pub fn ground(&mut self, parts: &[Part]) -> Result<()> {
        self.epoch = self.epoch.checked_add(1).ok_or_else(|| {
            Error::Engine(format!("epoch {} is the last one available", self.epoch))
        })?;
        debug!(epoch = self.epoch, parts = parts.len(), "grounding");
        let mut observer = GroundProgramObserver::new(&mut self.ground_program, self.epoch);
        self.engine.ground(parts, &mut observer)
    }
    /// Parses `text` and feeds its statements through a [`ProgramBuilder`].
    pub fn add_program(&mut self, text: &str) -> Result<()> {
        let mut statements = vec![];
        self.engine.parse(text, &mut |statement| {
            statements.push(statement);
            Ok(())
        })?;
        let mut builder = self.builder();
        for statement in statements {
            builder.add(statement)?;
        }
        builder.finish()
    }
    pub fn builder(&mut self) -> ProgramBuilder<'_, E> {
        ProgramBuilder { engine: &mut self.engine, parsed: &mut self.parsed_program, started: false }
    }
    /// Backend on the engine. Its additions are observed at the current epoch.
    pub fn backend(&mut self) -> Box<dyn Backend + '_> {
        let observer = GroundProgramObserver::new(&mut self.ground_program, self.epoch);
        self.engine.backend(Box::new(observer))
    }
    pub fn render(&self) -> Result<String> {
        self.ground_program.render_with_prefix(self.config.synthesized_prefix)
    }
    /// Symbols the engine derived as facts.
    pub fn facts(&self) -> Vec<Symbol> {
        let atoms = self.engine.symbolic_atoms().into_iter();
        atoms.filter(|atom| atom.is_fact).map(|atom| atom.symbol).collect()
    }
    /// Symbols of the atoms that are not facts, by atom.
    pub fn atom_to_symbol_mapping(&self) -> BTreeMap<Atom, Symbol> {
        let atoms = self.engine.symbolic_atoms().into_iter();
        atoms.filter(|atom| !atom.is_fact).map(|atom| (atom.atom, atom.symbol)).collect()
    }
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn ground_program(&self) -> &GroundProgram {
        &self.ground_program
    }
    pub fn into_ground_program(self) -> GroundProgram {
        self.ground_program
    }
    pub fn parsed_program(&self) -> &[Statement] {
        &self.parsed_program
    }
    pub fn engine(&self) -> &E {
        &self.engine
    }
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: Engine> ProgramBuilder<'_, E> {
    /// Records `statement` and forwards it. An engine error names the statement.
    fn record(&mut self, statement: Statement) -> Result<()> {
        let added = self.engine.add_statement(&statement).map_err(|err| Error::Statement {
            statement: statement.to_string(),
            source: Box::new(err),
        });
        self.parsed.push(statement);
        added
    }
    /// Records the implicit `#program base.` header unless `first` is that header.
    fn start(&mut self, first: Option<&Statement>) -> Result<()> {
        self.started = true;
        match first {
            Some(statement) if statement.is_base_header() => Ok(()),
            _ => self.record(Statement::base_header()),
        }
    }
    /// Ends the session; an empty session still records the base header.
    pub fn finish(mut self) -> Result<()> {
        if !self.started {
            self.start(None)?;
        }
        Ok(())
    }
}

impl<E: Engine> AstBuilder for ProgramBuilder<'_, E> {
    fn add(&mut self, statement: Statement) -> Result<()> {
        if !self.started {
            self.start(Some(&statement))?;
        }
        self.record(statement)
    }
}
