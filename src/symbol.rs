use crate::text::Text;
use core::cmp::Ordering;
use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Ground term as reported by the engine for output atoms.
#[derive(Hash, Eq, PartialEq, Clone)]
pub enum Symbol {
    Number(i32),
    String(Text),
    /// A tuple is a function with an empty name.
    Function { name: Text, args: Vec<Symbol>, positive: bool },
}

impl Symbol {
    pub fn number(n: i32) -> Self {
        Self::Number(n)
    }
    pub fn string(s: &str) -> Self {
        Self::String(Text::new(s))
    }
    pub fn constant(name: &str) -> Self {
        Self::function(name, vec![])
    }
    pub fn function(name: &str, args: Vec<Symbol>) -> Self {
        Self::Function { name: Text::new(name), args, positive: true }
    }
    pub fn tuple(args: Vec<Symbol>) -> Self {
        Self::function("", args)
    }
    pub fn negated(self) -> Self {
        match self {
            Self::Function { name, args, positive } => {
                Self::Function { name, args, positive: !positive }
            }
            other => other,
        }
    }
    /// `(name, arity, positive)` for functions, used to match `#show` signatures.
    pub fn signature(&self) -> Option<(Text, usize, bool)> {
        match self {
            Self::Function { name, args, positive } => Some((*name, args.len(), *positive)),
            _ => None,
        }
    }
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::String(_) => 1,
            Self::Function { .. } => 2,
        }
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        match [self, other] {
            [Self::Number(a), Self::Number(b)] => a.cmp(b),
            [Self::String(a), Self::String(b)] => a.cmp(b),
            [Self::Function { name: an, args: aa, positive: ap }, Self::Function { name: bn, args: ba, positive: bp }] => {
                an.cmp(bn)
                    .then_with(|| {
                        aa.iter()
                            .zip(ba)
                            .map(|(a, b)| a.cmp(b))
                            .fold(Ordering::Equal, Ordering::then)
                            .then(aa.len().cmp(&ba.len()))
                    })
                    // positive before classically negated
                    .then(bp.cmp(ap))
            }
            [a, b] => a.rank().cmp(&b.rank()),
        }
    }
}
impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => s.with_str(|s| {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }),
            Self::Function { name, args, positive } => {
                if !positive {
                    write!(f, "-")?;
                }
                write!(f, "{name}")?;
                let tuple = name.is_empty();
                if args.is_empty() && !tuple {
                    return Ok(());
                }
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                if tuple && args.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}
impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::Symbol;

    #[test]
    fn renders_surface_syntax() {
        let q = Symbol::function("q", vec![Symbol::number(1), Symbol::string("a\"b")]);
        assert_eq!(q.to_string(), r#"q(1,"a\"b")"#);
        assert_eq!(Symbol::constant("a").negated().to_string(), "-a");
        assert_eq!(Symbol::tuple(vec![Symbol::number(2)]).to_string(), "(2,)");
        assert_eq!(Symbol::tuple(vec![]).to_string(), "()");
    }

    #[test]
    fn orders_numbers_strings_then_functions() {
        let mut symbols = vec![
            Symbol::function("b", vec![Symbol::number(1)]),
            Symbol::constant("b"),
            Symbol::string("z"),
            Symbol::constant("a").negated(),
            Symbol::number(10),
            Symbol::constant("a"),
            Symbol::number(-3),
        ];
        symbols.sort();
        let shown: Vec<_> = symbols.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["-3", "10", "\"z\"", "a", "-a", "b", "b(1)"]);
    }
}
