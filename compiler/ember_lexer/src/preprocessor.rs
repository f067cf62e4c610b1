//! Textual preprocessing: comments, conditional blocks and macros.
//!
//! # Line preservation
//!
//! The output always has the same number of lines as the input. Comments
//! keep their newlines, directive lines and skipped blocks become empty
//! lines, joined continuation lines are padded back out, and a macro
//! invocation whose arguments span several lines is followed by the
//! newlines it consumed.
//!
//! # Supported directives
//!
//! `#define` (object-like and function-like, with `#` stringizing, `##`
//! pasting and `...`/`__VA_ARGS__`), `#undef`, `#ifdef`, `#ifndef`, `#if`,
//! `#elif`, `#else` and `#endif`. `#include` and `#pragma` are accepted and
//! ignored: loading other files is the embedder's job.

use ember_diagnostic::{PreprocessorError, PreprocessorErrorKind};
use rustc_hash::FxHashMap;
use std::cell::Cell;
use tracing::{debug, trace};

use crate::condition;
use crate::cursor::{is_identifier_continue, is_identifier_start, Cursor};

/// A `#define`d macro.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    /// `None` for object-like macros. A trailing `...` makes the macro
    /// variadic.
    pub parameters: Option<Vec<String>>,
    pub body: String,
}

impl Macro {
    pub fn object(body: impl Into<String>) -> Self {
        Macro {
            parameters: None,
            body: body.into(),
        }
    }

    pub fn function(parameters: &[&str], body: impl Into<String>) -> Self {
        Macro {
            parameters: Some(parameters.iter().map(|p| (*p).to_string()).collect()),
            body: body.into(),
        }
    }

    fn is_variadic(&self) -> bool {
        self.parameters
            .as_ref()
            .and_then(|parameters| parameters.last())
            .is_some_and(|last| last == "...")
    }
}

/// Macros visible to the preprocessor.
///
/// The environment owns one table: macros defined by the embedder and by
/// `#define` in earlier programs stay visible to later loads.
#[derive(Clone, Debug, Default)]
pub struct MacroTable {
    macros: FxHashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a macro.
    pub fn define(&mut self, name: impl Into<String>, definition: Macro) {
        let name = name.into();
        debug!(name = %name, "macro defined");
        self.macros.insert(name, definition);
    }

    pub fn undefine(&mut self, name: &str) -> bool {
        self.macros.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// State of one `#if` … `#endif` block.
struct Conditional {
    /// Whether the enclosing region is active.
    parent_active: bool,
    /// Whether some branch of this block has already been taken.
    taken: bool,
    active: bool,
    seen_else: bool,
    line: u32,
}

/// Preprocess `source`, recording `#define`s into `macros`.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn preprocess(source: &str, macros: &mut MacroTable) -> Result<String, PreprocessorError> {
    let stripped = strip_comments(source);
    let mut output = String::with_capacity(stripped.len());
    let mut conditionals: Vec<Conditional> = Vec::new();
    let mut pending = String::new();
    let mut pending_line = 1;
    let mut line = 1;

    let mut lines = stripped.split('\n').peekable();
    while let Some(first) = lines.next() {
        // Join continuation lines into one logical line.
        let mut logical = first.to_string();
        let mut physical = 1;
        while logical.ends_with('\\') && lines.peek().is_some() {
            logical.pop();
            logical.push_str(lines.next().unwrap_or_default());
            physical += 1;
        }
        let is_last = lines.peek().is_none();
        let active = conditionals.last().map_or(true, |c| c.active);

        if let Some(directive) = logical.trim_start().strip_prefix('#') {
            if !pending.is_empty() {
                flush(&mut pending, pending_line, macros, &mut output)?;
            }
            handle_directive(directive.trim(), line, macros, &mut conditionals)?;
            push_newlines(&mut output, physical, is_last);
        } else if active {
            if pending.is_empty() {
                pending_line = line;
            }
            pending.push_str(&logical);
            push_newlines(&mut pending, physical, is_last);
        } else {
            push_newlines(&mut output, physical, is_last);
        }
        line += physical;
    }

    if let Some(open) = conditionals.last() {
        return Err(PreprocessorError::new(
            PreprocessorErrorKind::UnterminatedConditional,
            open.line,
        ));
    }
    flush(&mut pending, pending_line, macros, &mut output)?;
    Ok(output)
}

/// Emit `count` newlines, except the one after the final line.
fn push_newlines(text: &mut String, count: u32, is_last: bool) {
    let count = if is_last { count - 1 } else { count };
    for _ in 0..count {
        text.push('\n');
    }
}

fn flush(
    pending: &mut String,
    line: u32,
    macros: &MacroTable,
    output: &mut String,
) -> Result<(), PreprocessorError> {
    let expander = Expander::new(macros);
    let expanded = expander
        .expand(pending, &mut Vec::new())
        .map_err(|kind| PreprocessorError::new(kind, line + expander.error_line.get()))?;
    output.push_str(&expanded);
    pending.clear();
    Ok(())
}

fn handle_directive(
    directive: &str,
    line: u32,
    macros: &mut MacroTable,
    conditionals: &mut Vec<Conditional>,
) -> Result<(), PreprocessorError> {
    let error = |kind| PreprocessorError::new(kind, line);
    let (keyword, argument) = split_identifier(directive);
    let argument = argument.trim();
    let active = conditionals.last().map_or(true, |c| c.active);
    trace!(line, keyword, active, "directive");

    match keyword {
        "ifdef" | "ifndef" | "if" => {
            let condition = active
                && match keyword {
                    "ifdef" => macros.is_defined(argument),
                    "ifndef" => !macros.is_defined(argument),
                    _ => evaluate_condition(argument, macros).ok_or_else(|| {
                        error(PreprocessorErrorKind::InvalidDirective {
                            directive: format!("#{directive}"),
                        })
                    })?,
                };
            conditionals.push(Conditional {
                parent_active: active,
                taken: condition,
                active: condition,
                seen_else: false,
                line,
            });
        }
        "elif" | "else" => {
            let Some(current) = conditionals.last_mut() else {
                return Err(error(PreprocessorErrorKind::UnmatchedConditional {
                    directive: format!("#{keyword}"),
                }));
            };
            if current.seen_else {
                return Err(error(PreprocessorErrorKind::InvalidDirective {
                    directive: format!("#{directive}"),
                }));
            }
            let take = current.parent_active
                && !current.taken
                && if keyword == "else" {
                    true
                } else {
                    evaluate_condition(argument, macros).ok_or_else(|| {
                        error(PreprocessorErrorKind::InvalidDirective {
                            directive: format!("#{directive}"),
                        })
                    })?
                };
            current.seen_else = keyword == "else";
            current.active = take;
            current.taken |= take;
        }
        "endif" => {
            if conditionals.pop().is_none() {
                return Err(error(PreprocessorErrorKind::UnmatchedConditional {
                    directive: "#endif".to_string(),
                }));
            }
        }
        _ if !active => {}
        "define" => {
            let (name, definition) = parse_definition(argument).map_err(error)?;
            macros.define(name, definition);
        }
        "undef" => {
            macros.undefine(argument);
        }
        "include" | "pragma" | "" => {}
        _ => {
            return Err(error(PreprocessorErrorKind::InvalidDirective {
                directive: format!("#{directive}"),
            }))
        }
    }
    Ok(())
}

/// Split a leading identifier off `text`.
fn split_identifier(text: &str) -> (&str, &str) {
    let end = text
        .bytes()
        .position(|b| !is_identifier_continue(b))
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Parse the text after `#define`.
fn parse_definition(text: &str) -> Result<(String, Macro), PreprocessorErrorKind> {
    let invalid = || PreprocessorErrorKind::InvalidMacroDefinition {
        definition: text.to_string(),
    };
    let (name, rest) = split_identifier(text);
    if name.is_empty() || !is_identifier_start(name.as_bytes()[0]) {
        return Err(invalid());
    }

    // A parameter list must follow the name with no space in between.
    let Some(after_paren) = rest.strip_prefix('(') else {
        return Ok((name.to_string(), Macro::object(rest.trim())));
    };
    let close = after_paren.find(')').ok_or_else(invalid)?;
    let list = after_paren[..close].trim();
    let parameters: Vec<String> = if list.is_empty() {
        Vec::new()
    } else {
        list.split(',').map(|p| p.trim().to_string()).collect()
    };
    let count = parameters.len();
    for (index, parameter) in parameters.iter().enumerate() {
        let valid = if parameter == "..." {
            index + 1 == count
        } else {
            parameter.bytes().next().is_some_and(is_identifier_start)
                && parameter.bytes().all(is_identifier_continue)
        };
        if !valid {
            return Err(invalid());
        }
    }
    Ok((
        name.to_string(),
        Macro {
            parameters: Some(parameters),
            body: after_paren[close + 1..].trim().to_string(),
        },
    ))
}

/// Resolve `defined`, expand macros and evaluate an `#if` condition.
fn evaluate_condition(expression: &str, macros: &MacroTable) -> Option<bool> {
    let mut resolved = String::with_capacity(expression.len());
    let mut cursor = Cursor::new(expression);
    while !cursor.is_eof() {
        let start = cursor.pos();
        if !is_identifier_start(cursor.current()) {
            cursor.advance();
            resolved.push_str(&expression[start..cursor.pos()]);
            continue;
        }
        cursor.eat_while(is_identifier_continue);
        if &expression[start..cursor.pos()] != "defined" {
            resolved.push_str(&expression[start..cursor.pos()]);
            continue;
        }
        cursor.eat_while(|b| b == b' ' || b == b'\t');
        let parenthesized = cursor.current() == b'(';
        if parenthesized {
            cursor.advance();
            cursor.eat_while(|b| b == b' ' || b == b'\t');
        }
        let name_start = cursor.pos();
        cursor.eat_while(is_identifier_continue);
        let name = &expression[name_start..cursor.pos()];
        if name.is_empty() {
            return None;
        }
        if parenthesized {
            cursor.eat_while(|b| b == b' ' || b == b'\t');
            if cursor.current() != b')' {
                return None;
            }
            cursor.advance();
        }
        resolved.push_str(if macros.is_defined(name) { " 1 " } else { " 0 " });
    }
    let expanded = Expander::new(macros)
        .expand(&resolved, &mut Vec::new())
        .ok()?;
    condition::evaluate(&expanded)
}

/// Remove comments, keeping string and character literals intact and
/// replacing each comment with a space plus the newlines it spanned.
fn strip_comments(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = Cursor::new(source);
    while !cursor.is_eof() {
        let start = cursor.pos();
        match cursor.current() {
            quote @ (b'"' | b'\'') => {
                skip_quoted(&mut cursor, quote);
                output.push_str(&source[start..cursor.pos()]);
            }
            b'/' if cursor.peek(1) == b'/' => {
                cursor.eat_while(|b| b != b'\n');
                output.push(' ');
            }
            b'/' if cursor.peek(1) == b'*' => {
                cursor.advance_by(2);
                output.push(' ');
                while !cursor.is_eof() && !cursor.starts_with("*/") {
                    if cursor.current() == b'\n' {
                        output.push('\n');
                    }
                    cursor.advance();
                }
                cursor.advance_by(2);
            }
            _ => {
                cursor.advance();
                while !cursor.is_eof() && !matches!(cursor.current(), b'"' | b'\'' | b'/') {
                    cursor.advance();
                }
                output.push_str(&source[start..cursor.pos()]);
            }
        }
    }
    output
}

/// Skip a quoted literal starting at the opening quote. Stops at the end of
/// the line when unterminated; the tokenizer reports that.
fn skip_quoted(cursor: &mut Cursor<'_>, quote: u8) {
    cursor.advance();
    while !cursor.is_eof() && cursor.current() != b'\n' {
        let byte = cursor.current();
        cursor.advance();
        if byte == b'\\' && !cursor.is_eof() && cursor.current() != b'\n' {
            cursor.advance();
        } else if byte == quote {
            return;
        }
    }
}

/// One piece of a macro body after parameter recognition.
enum Piece<'b> {
    Text(&'b str),
    Whitespace,
    Parameter(usize),
    Stringize(usize),
    Paste,
}

struct Expander<'m> {
    macros: &'m MacroTable,
    /// Line, relative to the expanded block, of the outermost invocation
    /// being expanded. Reported with errors.
    error_line: Cell<u32>,
    /// Expansions of macro arguments in progress.
    argument_depth: Cell<u32>,
}

impl<'m> Expander<'m> {
    fn new(macros: &'m MacroTable) -> Self {
        Expander {
            macros,
            error_line: Cell::new(0),
            argument_depth: Cell::new(0),
        }
    }

    /// Expand every macro in `text`. `disabled` holds the macros currently
    /// being expanded, which are not expanded again inside themselves.
    fn expand(
        &self,
        text: &str,
        disabled: &mut Vec<String>,
    ) -> Result<String, PreprocessorErrorKind> {
        let mut output = String::with_capacity(text.len());
        let mut cursor = Cursor::new(text);
        while !cursor.is_eof() {
            let start = cursor.pos();
            let byte = cursor.current();
            if byte == b'"' || byte == b'\'' {
                skip_quoted(&mut cursor, byte);
                output.push_str(&text[start..cursor.pos()]);
                continue;
            }
            if byte.is_ascii_digit() {
                // pp-number: keeps suffixes and exponents away from macro lookup
                cursor.advance();
                while !cursor.is_eof() {
                    let b = cursor.current();
                    if matches!(b, b'+' | b'-')
                        && matches!(text.as_bytes()[cursor.pos() - 1], b'e' | b'E')
                    {
                        cursor.advance();
                    } else if is_identifier_continue(b) || b == b'.' {
                        cursor.advance();
                    } else {
                        break;
                    }
                }
                output.push_str(&text[start..cursor.pos()]);
                continue;
            }
            if !is_identifier_start(byte) {
                cursor.advance();
                output.push_str(&text[start..cursor.pos()]);
                continue;
            }

            if disabled.is_empty() && self.argument_depth.get() == 0 {
                self.error_line.set(cursor.line() - 1);
            }
            cursor.eat_while(is_identifier_continue);
            let name = &text[start..cursor.pos()];
            let definition = match self.macros.get(name) {
                Some(definition) if !disabled.iter().any(|d| d == name) => definition,
                _ => {
                    output.push_str(name);
                    continue;
                }
            };

            let Some(parameters) = &definition.parameters else {
                disabled.push(name.to_string());
                let expanded = self.expand(&definition.body, disabled);
                disabled.pop();
                output.push_str(&expanded?);
                continue;
            };

            // A function-like macro name not followed by `(` is left alone.
            let mut lookahead = cursor.pos();
            while text
                .as_bytes()
                .get(lookahead)
                .is_some_and(u8::is_ascii_whitespace)
            {
                lookahead += 1;
            }
            if text.as_bytes().get(lookahead) != Some(&b'(') {
                output.push_str(name);
                continue;
            }

            cursor.advance_by(lookahead - cursor.pos() + 1);
            let arguments_start = cursor.pos();
            let arguments = collect_arguments(&mut cursor, text).ok_or_else(|| {
                PreprocessorErrorKind::UnterminatedMacroInvocation {
                    name: name.to_string(),
                }
            })?;
            let consumed_newlines = text[arguments_start..cursor.pos()]
                .bytes()
                .filter(|&b| b == b'\n')
                .count();

            let arguments = bind_arguments(name, definition, parameters, arguments)?;
            // Arguments expand with the caller's disabled set; only the
            // rescan of the body hides the macro from itself.
            let body = self.substitute(&definition.body, parameters, &arguments, disabled)?;
            disabled.push(name.to_string());
            let rescanned = self.expand(&body, disabled);
            disabled.pop();
            output.push_str(&rescanned?);
            for _ in 0..consumed_newlines {
                output.push('\n');
            }
        }
        Ok(output)
    }

    /// Replace parameters in a function-like macro body.
    fn substitute(
        &self,
        body: &str,
        parameters: &[String],
        arguments: &[String],
        disabled: &mut Vec<String>,
    ) -> Result<String, PreprocessorErrorKind> {
        let pieces = split_body(body, parameters);
        let is_paste_neighbour = |index: usize| {
            let before = pieces[..index]
                .iter()
                .rev()
                .find(|p| !matches!(p, Piece::Whitespace));
            let after = pieces[index + 1..]
                .iter()
                .find(|p| !matches!(p, Piece::Whitespace));
            matches!(before, Some(Piece::Paste)) || matches!(after, Some(Piece::Paste))
        };

        let mut output = String::with_capacity(body.len());
        let mut gluing = false;
        for (index, piece) in pieces.iter().enumerate() {
            match piece {
                Piece::Whitespace if gluing => continue,
                Piece::Whitespace => output.push(' '),
                Piece::Paste => {
                    output.truncate(output.trim_end().len());
                    gluing = true;
                    continue;
                }
                Piece::Text(text) => output.push_str(text),
                Piece::Stringize(parameter) => {
                    output.push('"');
                    for c in arguments[*parameter].chars() {
                        if c == '"' || c == '\\' {
                            output.push('\\');
                        }
                        output.push(c);
                    }
                    output.push('"');
                }
                Piece::Parameter(parameter) => {
                    let argument = &arguments[*parameter];
                    if is_paste_neighbour(index) {
                        output.push_str(argument);
                    } else {
                        self.argument_depth.set(self.argument_depth.get() + 1);
                        let expanded = self.expand(argument, disabled);
                        self.argument_depth.set(self.argument_depth.get() - 1);
                        output.push_str(&expanded?);
                    }
                }
            }
            gluing = false;
        }
        Ok(output)
    }
}

/// Read invocation arguments after the opening parenthesis, leaving the
/// cursor past the closing one. `None` when the invocation never closes.
fn collect_arguments(cursor: &mut Cursor<'_>, text: &str) -> Option<Vec<String>> {
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = cursor.pos();
    loop {
        if cursor.is_eof() {
            return None;
        }
        match cursor.current() {
            quote @ (b'"' | b'\'') => {
                skip_quoted(cursor, quote);
                continue;
            }
            b'(' => depth += 1,
            b')' if depth == 0 => {
                arguments.push(normalize_argument(&text[start..cursor.pos()]));
                cursor.advance();
                return Some(arguments);
            }
            b')' => depth -= 1,
            b',' if depth == 0 => {
                arguments.push(normalize_argument(&text[start..cursor.pos()]));
                cursor.advance();
                start = cursor.pos();
                continue;
            }
            _ => {}
        }
        cursor.advance();
    }
}

fn normalize_argument(argument: &str) -> String {
    argument.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Match invocation arguments to parameters. Variadic extras are joined
/// into the last argument.
fn bind_arguments(
    name: &str,
    definition: &Macro,
    parameters: &[String],
    mut arguments: Vec<String>,
) -> Result<Vec<String>, PreprocessorErrorKind> {
    if parameters.is_empty() && arguments.len() == 1 && arguments[0].is_empty() {
        arguments.clear();
    }
    let mismatch = |found| PreprocessorErrorKind::MacroArgumentCountMismatch {
        name: name.to_string(),
        expected: parameters.len(),
        found,
    };
    if definition.is_variadic() {
        let fixed = parameters.len() - 1;
        if arguments.len() < fixed {
            return Err(mismatch(arguments.len()));
        }
        let rest = arguments.split_off(fixed).join(", ");
        arguments.push(rest);
    } else if arguments.len() != parameters.len() {
        return Err(mismatch(arguments.len()));
    }
    Ok(arguments)
}

fn split_body<'b>(body: &'b str, parameters: &[String]) -> Vec<Piece<'b>> {
    let parameter_index = |word: &str| {
        parameters.iter().position(|p| {
            p == word || (p == "..." && word == "__VA_ARGS__")
        })
    };
    let mut pieces = Vec::new();
    let mut cursor = Cursor::new(body);
    while !cursor.is_eof() {
        let start = cursor.pos();
        let byte = cursor.current();
        if byte.is_ascii_whitespace() {
            cursor.eat_while(|b| b.is_ascii_whitespace());
            pieces.push(Piece::Whitespace);
        } else if cursor.starts_with("##") {
            cursor.advance_by(2);
            pieces.push(Piece::Paste);
        } else if byte == b'#' {
            cursor.advance();
            cursor.eat_while(|b| b == b' ' || b == b'\t');
            let word_start = cursor.pos();
            cursor.eat_while(is_identifier_continue);
            match parameter_index(&body[word_start..cursor.pos()]) {
                Some(index) => pieces.push(Piece::Stringize(index)),
                None => pieces.push(Piece::Text(&body[start..cursor.pos()])),
            }
        } else if byte == b'"' || byte == b'\'' {
            skip_quoted(&mut cursor, byte);
            pieces.push(Piece::Text(&body[start..cursor.pos()]));
        } else if is_identifier_continue(byte) {
            cursor.eat_while(is_identifier_continue);
            let word = &body[start..cursor.pos()];
            match parameter_index(word) {
                Some(index) if is_identifier_start(byte) => pieces.push(Piece::Parameter(index)),
                _ => pieces.push(Piece::Text(word)),
            }
        } else {
            cursor.advance();
            pieces.push(Piece::Text(&body[start..cursor.pos()]));
        }
    }
    pieces
}

#[cfg(test)]
mod tests;
