//! Named-parameter binding and `IN (...)` list expansion.
//!
//! Queries are written with `:name` placeholders. Binding resolves each
//! placeholder against an [`Args`] set, whose keys are struct-style field
//! names translated through the database's [`NameMapper`]. The result is a
//! [`BoundQuery`] with bare `?` placeholders, which is then either checked
//! for single values ([`BoundQuery::into_values`]) or has its list arguments
//! expanded ([`BoundQuery::expand_in`]). [`rebind`] finally numbers the
//! placeholders in SQLite's `?NNN` form.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use rusqlite::types::Value;

use crate::errors::DatabaseError;
use crate::naming::NameMapper;

/// A bound argument: a single value or a list for `IN (...)` expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    List(Vec<Value>),
}

/// An ordered set of named arguments.
///
/// ```
/// use sqlxx::db::Args;
///
/// let args = Args::new()
///     .bind("ownerID", 7_i64)
///     .bind_list("statusCodes", ["open".to_string(), "held".to_string()]);
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args {
    entries: Vec<(String, Arg)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a single value to `field`.
    pub fn bind<V: Into<Value>>(mut self, field: impl Into<String>, value: V) -> Self {
        self.entries.push((field.into(), Arg::Value(value.into())));
        self
    }

    /// Bind a list of values to `field`, for use inside `IN (...)`.
    pub fn bind_list<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.entries.push((field.into(), Arg::List(list)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholder name -> argument. Mapped column names win over raw field
    /// names; a later binding of the same column replaces an earlier one.
    fn lookup<'a>(&'a self, names: &NameMapper) -> HashMap<String, &'a Arg> {
        let mut by_column = HashMap::with_capacity(self.entries.len() * 2);
        for (field, arg) in &self.entries {
            by_column.insert(names.map(field), arg);
        }
        for (field, arg) in &self.entries {
            by_column.entry(field.clone()).or_insert(arg);
        }
        by_column
    }
}

/// A query whose `:name` placeholders were replaced by `?`, together with
/// the arguments in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    /// `(placeholder name, argument)` in the order the placeholders appear.
    pub args: Vec<(String, Arg)>,
}

impl BoundQuery {
    /// Return the query and its values, rejecting list arguments.
    pub fn into_values(self) -> Result<(String, Vec<Value>), DatabaseError> {
        let values = self
            .args
            .into_iter()
            .map(|(name, arg)| match arg {
                Arg::Value(value) => Ok(value),
                Arg::List(_) => Err(DatabaseError::UnexpectedList { name }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((self.sql, values))
    }

    /// Replace each `?` bound to a list with one `?` per element and flatten
    /// the values in order.
    pub fn expand_in(self) -> Result<(String, Vec<Value>), DatabaseError> {
        let arg_count = self.args.len();
        let mut pending = self.args.into_iter();
        let mut values = Vec::with_capacity(arg_count);
        let mut placeholders = 0;

        let (sql, _) = rewrite_placeholders(&self.sql, |out| {
            placeholders += 1;
            match pending.next() {
                Some((_, Arg::Value(value))) => {
                    out.push('?');
                    values.push(value);
                }
                Some((name, Arg::List(list))) => {
                    if list.is_empty() {
                        return Err(DatabaseError::EmptyList { name });
                    }
                    for (i, value) in list.into_iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push('?');
                        values.push(value);
                    }
                }
                None => out.push('?'),
            }
            Ok(())
        })?;

        if placeholders != arg_count {
            return Err(DatabaseError::ArgumentCount {
                placeholders,
                args: arg_count,
            });
        }
        Ok((sql, values))
    }
}

/// Replace `:name` placeholders with `?` and collect the matching arguments.
///
/// Placeholder names consist of ASCII alphanumerics, `_` and `.`. `::`
/// produces a literal `:`, a `:` followed by anything else is copied as is,
/// and quoted literals and comments are left untouched.
pub fn bind_named(
    query: &str,
    args: &Args,
    names: &NameMapper,
) -> Result<BoundQuery, DatabaseError> {
    let lookup = args.lookup(names);
    let mut sql = String::with_capacity(query.len());
    let mut bound = Vec::new();
    let mut chars = query.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            sql.push(c);
            continue;
        }
        if copy_comment(c, &mut chars, &mut sql) {
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                sql.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                sql.push(':');
            }
            ':' if chars.peek().is_some_and(|n| is_name_char(*n)) => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_name_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                let arg = lookup
                    .get(name.as_str())
                    .ok_or_else(|| DatabaseError::MissingArgument { name: name.clone() })?;
                bound.push((name, (*arg).clone()));
                sql.push('?');
            }
            _ => sql.push(c),
        }
    }

    Ok(BoundQuery { sql, args: bound })
}

/// Number bare `?` placeholders as `?1`, `?2`, ... (SQLite syntax).
///
/// A query that already uses numbered `?NNN` placeholders is returned as is
/// when it has no bare `?`, and rejected with
/// [`DatabaseError::MixedPlaceholders`] when it has both.
pub fn rebind(query: &str) -> Result<String, DatabaseError> {
    let mut n = 0usize;
    let (sql, numbered) = rewrite_placeholders(query, |out| {
        n += 1;
        out.push('?');
        out.push_str(&n.to_string());
        Ok(())
    })?;
    if n > 0 && numbered > 0 {
        return Err(DatabaseError::MixedPlaceholders { numbered, bare: n });
    }
    Ok(sql)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// If `c` opens a `--` or `/* */` comment, copy the whole comment to `out`
/// and return true.
fn copy_comment(c: char, chars: &mut Peekable<Chars<'_>>, out: &mut String) -> bool {
    match (c, chars.peek()) {
        ('-', Some('-')) => {
            out.push(c);
            for n in chars.by_ref() {
                out.push(n);
                if n == '\n' {
                    break;
                }
            }
            true
        }
        ('/', Some('*')) => {
            out.push(c);
            if let Some(star) = chars.next() {
                out.push(star);
            }
            let mut prev = None;
            for n in chars.by_ref() {
                out.push(n);
                if prev == Some('*') && n == '/' {
                    break;
                }
                prev = Some(n);
            }
            true
        }
        _ => false,
    }
}

/// Copy `query`, handing every bare `?` outside quoted literals and comments
/// to `on_placeholder` instead of copying it. Already numbered `?NNN`
/// placeholders are copied unchanged and counted.
fn rewrite_placeholders<F>(
    query: &str,
    mut on_placeholder: F,
) -> Result<(String, usize), DatabaseError>
where
    F: FnMut(&mut String) -> Result<(), DatabaseError>,
{
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut quote: Option<char> = None;
    let mut numbered = 0;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }
        if copy_comment(c, &mut chars, &mut out) {
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            '?' if chars.peek().is_some_and(|n| n.is_ascii_digit()) => {
                numbered += 1;
                out.push(c);
            }
            '?' => on_placeholder(&mut out)?,
            _ => out.push(c),
        }
    }
    Ok((out, numbered))
}
