use crate::ast::{BodyLiteral, Head, MinimizeElement, Statement, SumElement};
use crate::{Error, HeuristicType, Symbol};
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{anychar, char as nomchar, digit1, multispace1, satisfy},
    combinator::{all_consuming, map as nommap, map_res, opt, recognize, value, verify},
    error::{convert_error, VerboseError},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
};
pub type IResult<I, O, E = VerboseError<I>> = Result<(I, O), nom::Err<E>>;

//////////////////////////////////////

type In<'a> = &'a str;

/// Skips whitespace and `%` line comments.
pub fn skip(s: In) -> IResult<In, ()> {
    let comment = recognize(pair(nomchar('%'), take_while(|c: char| c != '\n')));
    value((), many0(alt((multispace1, comment))))(s)
}

pub fn wsl<'a, F, O>(inner: F) -> impl FnMut(In<'a>) -> IResult<In<'a>, O>
where
    F: FnMut(In<'a>) -> IResult<In<'a>, O> + 'a,
{
    preceded(skip, inner)
}

fn punct<'a>(c: char) -> impl FnMut(In<'a>) -> IResult<In<'a>, char> {
    wsl(nomchar(c))
}

pub fn ident(s: In) -> IResult<In, In> {
    let first = satisfy(|c| c.is_ascii_lowercase() || c == '_');
    let rest = take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '\'');
    verify(wsl(recognize(pair(first, rest))), |id: &str| id != "not")(s)
}

pub fn number(s: In) -> IResult<In, i32> {
    map_res(wsl(recognize(pair(opt(nomchar('-')), digit1))), |n: &str| n.parse::<i32>())(s)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn string(s: In) -> IResult<In, Symbol> {
    let escaped = recognize(pair(nomchar('\\'), anychar));
    let contents = recognize(many0(alt((escaped, is_not("\\\"")))));
    let quoted = delimited(nomchar('"'), contents, nomchar('"'));
    nommap(wsl(quoted), |raw| Symbol::string(&unescape(raw)))(s)
}

fn arguments(s: In) -> IResult<In, Vec<Symbol>> {
    delimited(punct('('), separated_list0(punct(','), term), punct(')'))(s)
}

pub fn function(s: In) -> IResult<In, Symbol> {
    let p = tuple((opt(punct('-')), ident, opt(arguments)));
    nommap(p, |(neg, name, args)| {
        let symbol = Symbol::function(name, args.unwrap_or_default());
        match neg {
            Some(_) => symbol.negated(),
            None => symbol,
        }
    })(s)
}

pub fn term(s: In) -> IResult<In, Symbol> {
    let num = nommap(number, Symbol::Number);
    // `(t)` is just `t`, anything else in parentheses is a tuple
    let tup = nommap(arguments, |mut args| match args.len() {
        1 => args.remove(0),
        _ => Symbol::tuple(args),
    });
    alt((num, string, function, tup))(s)
}

fn not(s: In) -> IResult<In, In> {
    wsl(terminated(tag("not"), multispace1))(s)
}

/// A possibly default-negated atom: `(positive, atom)`.
pub fn literal(s: In) -> IResult<In, (bool, Symbol)> {
    nommap(pair(opt(not), term), |(neg, atom)| (neg.is_none(), atom))(s)
}

fn sum_element(s: In) -> IResult<In, SumElement> {
    let p = tuple((number, punct(':'), literal));
    nommap(p, |(weight, _, (positive, atom))| SumElement { weight, atom, positive })(s)
}

pub fn sum(s: In) -> IResult<In, BodyLiteral> {
    let open = pair(wsl(tag("#sum")), punct('{'));
    let elements = delimited(open, separated_list0(punct(';'), sum_element), punct('}'));
    let lower = preceded(wsl(tag(">=")), number);
    nommap(pair(elements, lower), |(elements, lower)| BodyLiteral::Sum { elements, lower })(s)
}

pub fn body_literal(s: In) -> IResult<In, BodyLiteral> {
    let lit = nommap(literal, |(positive, atom)| BodyLiteral::Literal { atom, positive });
    alt((sum, lit))(s)
}

pub fn head(s: In) -> IResult<In, Head> {
    let choice = delimited(punct('{'), separated_list0(punct(';'), term), punct('}'));
    let disjunction = separated_list0(wsl(alt((tag(";"), tag("|")))), term);
    alt((nommap(choice, Head::Choice), nommap(disjunction, Head::Disjunction)))(s)
}

pub fn rule(s: In) -> IResult<In, Statement> {
    let body = nommap(
        opt(preceded(wsl(tag(":-")), separated_list1(punct(','), body_literal))),
        Option::unwrap_or_default,
    );
    let p = terminated(pair(head, body), punct('.'));
    fn nonempty((head, body): &(Head, Vec<BodyLiteral>)) -> bool {
        !body.is_empty() || *head != Head::Disjunction(vec![])
    }
    nommap(verify(p, nonempty), |(head, body)| Statement::Rule { head, body })(s)
}

pub fn program_header(s: In) -> IResult<In, Statement> {
    let params = delimited(punct('('), separated_list0(punct(','), ident), punct(')'));
    let p = delimited(wsl(tag("#program")), pair(ident, opt(params)), punct('.'));
    nommap(p, |(name, params)| {
        Statement::program_header(name, &params.unwrap_or_default())
    })(s)
}

pub fn show(s: In) -> IResult<In, Statement> {
    let arity = map_res(wsl(digit1), |n: &str| n.parse::<usize>());
    let signature = tuple((opt(punct('-')), ident, preceded(punct('/'), arity)));
    let p = delimited(wsl(tag("#show")), signature, punct('.'));
    nommap(p, |(neg, name, arity)| Statement::Show {
        name: name.into(),
        arity,
        positive: neg.is_none(),
    })(s)
}

pub fn project(s: In) -> IResult<In, Statement> {
    nommap(delimited(wsl(tag("#project")), term, punct('.')), Statement::Project)(s)
}

pub fn external(s: In) -> IResult<In, Statement> {
    nommap(delimited(wsl(tag("#external")), term, punct('.')), Statement::External)(s)
}

/// Optional `: l1, l2` condition of a directive.
fn condition(s: In) -> IResult<In, Vec<BodyLiteral>> {
    let body = preceded(punct(':'), separated_list1(punct(','), body_literal));
    nommap(opt(body), Option::unwrap_or_default)(s)
}

pub fn show_term(s: In) -> IResult<In, Statement> {
    let p = delimited(wsl(tag("#show")), pair(term, condition), punct('.'));
    nommap(p, |(term, body)| Statement::ShowTerm { term, body })(s)
}

fn minimize_element(s: In) -> IResult<In, MinimizeElement> {
    let p = tuple((number, opt(preceded(punct('@'), number)), punct(':'), literal));
    nommap(p, |(weight, priority, _, (positive, atom))| MinimizeElement {
        weight,
        priority: priority.unwrap_or(0),
        atom,
        positive,
    })(s)
}

pub fn minimize(s: In) -> IResult<In, Statement> {
    let open = pair(wsl(tag("#minimize")), punct('{'));
    let elements = delimited(open, separated_list0(punct(';'), minimize_element), punct('}'));
    nommap(terminated(elements, punct('.')), Statement::Minimize)(s)
}

fn heuristic_type(s: In) -> IResult<In, HeuristicType> {
    wsl(alt((
        value(HeuristicType::Level, tag("level")),
        value(HeuristicType::Sign, tag("sign")),
        value(HeuristicType::Factor, tag("factor")),
        value(HeuristicType::Init, tag("init")),
        value(HeuristicType::True, tag("true")),
        value(HeuristicType::False, tag("false")),
    )))(s)
}

pub fn heuristic(s: In) -> IResult<In, Statement> {
    let priority = map_res(number, |n: i32| u32::try_from(n));
    let modifier = delimited(
        punct('['),
        tuple((number, opt(preceded(punct('@'), priority)), preceded(punct(','), heuristic_type))),
        punct(']'),
    );
    let p = tuple((preceded(wsl(tag("#heuristic")), term), condition, punct('.'), modifier));
    nommap(p, |(atom, body, _, (bias, priority, kind))| Statement::Heuristic {
        atom,
        body,
        bias,
        priority: priority.unwrap_or(0),
        kind,
    })(s)
}

pub fn edge(s: In) -> IResult<In, Statement> {
    let nodes = delimited(punct('('), separated_pair(term, punct(','), term), punct(')'));
    let p = delimited(wsl(tag("#edge")), pair(nodes, condition), punct('.'));
    nommap(p, |((u, v), body)| Statement::Edge { u, v, body })(s)
}

pub fn statement(s: In) -> IResult<In, Statement> {
    alt((program_header, show, show_term, project, external, minimize, heuristic, edge, rule))(s)
}

/// Parses a whole source text into its top-level statements.
pub fn statements(source: &str) -> crate::Result<Vec<Statement>> {
    match all_consuming(terminated(many0(statement), skip))(source) {
        Ok((_, statements)) => Ok(statements),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let rest = e.errors.first().map_or(source, |(rest, _)| *rest);
            let rest = skip(rest).map_or(rest, |(rest, _)| rest);
            let offset = source.len() - rest.len();
            Err(Error::Parse { message: convert_error(source, e), offset })
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(Error::Parse { message: "incomplete input".into(), offset: source.len() })
        }
    }
}
