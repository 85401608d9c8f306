pub mod ast;
pub mod config;
pub mod controller;
pub mod engine;
pub mod entity;
pub mod error;
pub mod observer;
pub mod parse;
pub mod pretty;
pub mod program;
pub mod propositional;
pub mod symbol;
pub mod text;

#[cfg(test)]
pub mod test;

pub use controller::{AstBuilder, Controller, ProgramBuilder};
pub use engine::{Backend, Engine, Part, SymbolicAtom, SymbolicBackend};
pub use entity::{
    Assume, Edge, External, GroundObject, Heuristic, Minimize, OutputAtom, Project, Rule, Show,
    WeightRule,
};
pub use error::{Error, Result};
pub use observer::{GroundProgramObserver, Observer};
pub use program::GroundProgram;
pub use symbol::Symbol;
pub use text::Text;

use core::num::NonZeroI32;

/// Ground atom id as allocated by the engine. `0` is reserved for "no atom".
pub type Atom = u32;
pub type Weight = i32;
/// Sequence number of a top-level `ground()` call.
pub type Epoch = u32;

/// Signed reference to an atom. The magnitude is the atom, the sign its polarity.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone, Copy)]
pub struct Literal(NonZeroI32);

#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone, Copy)]
pub enum TruthValue {
    False,
    True,
    Free,
    Release,
}

/// How a `#heuristic` directive modifies the solver's choice of its atom.
#[derive(Debug, Hash, PartialOrd, Ord, Eq, PartialEq, Clone, Copy)]
pub enum HeuristicType {
    Level,
    Sign,
    Factor,
    Init,
    True,
    False,
}

impl Literal {
    pub fn new(raw: i32) -> Result<Self> {
        NonZeroI32::new(raw)
            .map(Self)
            .ok_or_else(|| Error::MalformedEvent("literal 0 does not reference an atom".into()))
    }
    pub fn positive(atom: Atom) -> Result<Self> {
        Self::new(Self::signed(atom)?)
    }
    pub fn negative(atom: Atom) -> Result<Self> {
        Self::new(-Self::signed(atom)?)
    }
    fn signed(atom: Atom) -> Result<i32> {
        i32::try_from(atom)
            .map_err(|_| Error::MalformedEvent(format!("atom {atom} does not fit a literal")))
    }
    pub fn atom(self) -> Atom {
        self.0.get().unsigned_abs()
    }
    pub fn is_positive(self) -> bool {
        self.0.get() > 0
    }
    pub fn get(self) -> i32 {
        self.0.get()
    }
}

impl TruthValue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::False => "false",
            Self::True => "true",
            Self::Free => "free",
            Self::Release => "release",
        }
    }
}

impl HeuristicType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Sign => "sign",
            Self::Factor => "factor",
            Self::Init => "init",
            Self::True => "true",
            Self::False => "false",
        }
    }
}
