//! Statements: blocks, control flow and the dispatch between declarations
//! and expression statements.
//!
//! A statement starting with a type followed by a declarator is a
//! declaration; anything else is parsed as an expression. Declarations of
//! several variables produce one statement per variable.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    Expr, Stmt, StmtKind, SwitchCase, TokenKind, TypeUsage, VariableDeclaration, VariableStorage,
};

use crate::{ParseResult, Parser};

fn misplaced(statement: &str) -> CompileErrorKind {
    CompileErrorKind::MisplacedStatement {
        statement: statement.to_string(),
    }
}

impl Parser<'_> {
    pub(crate) fn parse_statements_to_end(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.cursor.is_at_end() {
            self.parse_statement_into(&mut statements)?;
        }
        Ok(statements)
    }

    /// Statements up to and including the closing `}`.
    pub(crate) fn parse_block_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.cursor.eat("}") {
            if self.cursor.is_at_end() {
                return Err(self.cursor.expected("}"));
            }
            self.parse_statement_into(&mut statements)?;
        }
        Ok(statements)
    }

    /// Exactly one statement, as the body of a branch or loop.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        let mut statements = Vec::new();
        self.parse_statement_into(&mut statements)?;
        if statements.len() == 1 {
            Ok(statements.remove(0))
        } else {
            Ok(Stmt::new(StmtKind::Block(statements), line))
        }
    }

    /// Parse one statement, appending what it produces. An empty statement
    /// produces nothing.
    pub(crate) fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        let line = self.cursor.line();
        if self.cursor.eat(";") {
            return Ok(());
        }
        if self.cursor.eat("{") {
            let statements = self.with_scope(Parser::parse_block_statements)?;
            out.push(Stmt::new(StmtKind::Block(statements), line));
            return Ok(());
        }
        if self.cursor.check_kind(TokenKind::Keyword) {
            let statement = match self.cursor.text() {
                "if" => Some(self.parse_if()?),
                "while" => Some(self.parse_while()?),
                "do" => Some(self.parse_do_while()?),
                "for" => Some(self.parse_for()?),
                "switch" => Some(self.parse_switch()?),
                "break" => Some(self.parse_jump("break")?),
                "continue" => Some(self.parse_jump("continue")?),
                "return" => Some(self.parse_return()?),
                "namespace" => Some(self.parse_namespace()?),
                "using" => Some(self.parse_using()?),
                "typedef" => Some(self.parse_typedef()?),
                "enum" => Some(self.parse_enum_declaration()?),
                "struct" | "class" => {
                    out.extend(self.parse_struct_declaration()?);
                    return Ok(());
                }
                keyword @ ("case" | "default" | "public" | "private" | "protected" | "else") => {
                    return Err(self.error(misplaced(keyword)));
                }
                _ => None,
            };
            if let Some(statement) = statement {
                out.push(statement);
                return Ok(());
            }
        }
        if let Some(declarations) = self.try_parse_declaration()? {
            out.extend(declarations);
            return Ok(());
        }
        let expr = self.parse_expression()?;
        self.cursor.expect(";")?;
        out.push(Stmt::new(StmtKind::Expression(expr), line));
        Ok(())
    }

    /// A branch or loop body in its own scope.
    fn parse_scoped_statement(&mut self) -> ParseResult<Stmt> {
        self.with_scope(Parser::parse_statement)
    }

    /// Run `f` with one more enclosing loop (or switch, when `is_loop` is
    /// false).
    fn in_breakable<T>(
        &mut self,
        is_loop: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.context.breakables += 1;
        if is_loop {
            self.context.loops += 1;
        }
        let result = f(self);
        self.context.breakables -= 1;
        if is_loop {
            self.context.loops -= 1;
        }
        result
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        let condition = self.parse_parenthesized_condition()?;
        let then_branch = Box::new(self.parse_scoped_statement()?);
        let else_branch = if self.cursor.eat("else") {
            Some(Box::new(self.parse_scoped_statement()?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        let condition = self.parse_parenthesized_condition()?;
        let body = Box::new(self.in_breakable(true, Parser::parse_scoped_statement)?);
        Ok(Stmt::new(StmtKind::While { condition, body }, line))
    }

    fn parse_do_while(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        let body = Box::new(self.in_breakable(true, Parser::parse_scoped_statement)?);
        self.cursor.expect("while")?;
        let condition = self.parse_parenthesized_condition()?;
        self.cursor.expect(";")?;
        Ok(Stmt::new(StmtKind::DoWhile { body, condition }, line))
    }

    /// `for (init; condition; increment)` or `for (T x : array)`. A
    /// declaration of several variables in the init part moves them to a
    /// block around the loop.
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        self.cursor.expect("(")?;
        self.with_scope(|parser| {
            if let Some(range_for) = parser.try_parse_range_for(line)? {
                return Ok(range_for);
            }
            let mut initialization = Vec::new();
            parser.parse_statement_into(&mut initialization)?;

            let condition = if parser.cursor.check(";") {
                None
            } else {
                let condition = parser.parse_expression()?;
                parser.check_condition(&condition)?;
                Some(condition)
            };
            parser.cursor.expect(";")?;
            let increment = if parser.cursor.check(")") {
                None
            } else {
                Some(parser.parse_expression()?)
            };
            parser.cursor.expect(")")?;
            let body = Box::new(parser.in_breakable(true, Parser::parse_scoped_statement)?);

            let init = if initialization.len() == 1 {
                Some(Box::new(initialization.remove(0)))
            } else {
                None
            };
            let for_loop = Stmt::new(
                StmtKind::For {
                    initialization: init,
                    condition,
                    increment,
                    body,
                },
                line,
            );
            if initialization.is_empty() {
                Ok(for_loop)
            } else {
                initialization.push(for_loop);
                Ok(Stmt::new(StmtKind::Block(initialization), line))
            }
        })
    }

    fn try_parse_range_for(&mut self, line: u32) -> ParseResult<Option<Stmt>> {
        let start = self.cursor.pos();
        let Some(usage) = self.try_parse_type_usage()? else {
            return Ok(None);
        };
        if !(self.cursor.check_kind(TokenKind::Identifier) && self.cursor.check_at(1, ":")) {
            self.cursor.set_pos(start);
            return Ok(None);
        }
        let name_text = self.cursor.text();
        let name_line = self.cursor.line();
        self.cursor.advance();
        self.cursor.advance();

        let collection = self.parse_expression()?;
        self.cursor.expect(")")?;
        let collection_usage = collection.type_usage;
        if !collection_usage.is_array() {
            return Err(self.error_at(
                CompileErrorKind::Expected {
                    expected: "array".to_string(),
                },
                collection.line,
            ));
        }
        let element = collection_usage.element();
        let compatible = self.registry.compatibility(usage, element).is_compatible();
        if !compatible {
            return Err(self.error_at(
                CompileErrorKind::IncompatibleTypes {
                    from: self.type_name(element),
                    to: self.type_name(usage),
                },
                name_line,
            ));
        }

        let name = self.registry.intern(name_text);
        self.context.declare_local(name, usage);
        let body = Box::new(self.in_breakable(true, Parser::parse_scoped_statement)?);
        Ok(Some(Stmt::new(
            StmtKind::ForRange {
                variable: VariableDeclaration {
                    name,
                    type_usage: usage,
                    initializer: None,
                    storage: VariableStorage::Local,
                },
                collection,
                body,
            },
            line,
        )))
    }

    /// `switch` over an integral value. Cases fall through until a `break`.
    fn parse_switch(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        let condition = self.parse_parenthesized_condition()?;
        if !self.registry.is_integral(condition.type_usage.value_usage()) {
            return Err(self.error_at(
                CompileErrorKind::NonIntegerValue {
                    context: "switch".to_string(),
                },
                condition.line,
            ));
        }
        let value_usage = condition.type_usage.value_usage();
        self.cursor.expect("{")?;
        let cases = self.in_breakable(false, |parser| {
            parser.with_scope(|parser| parser.parse_switch_cases(value_usage))
        })?;
        Ok(Stmt::new(StmtKind::Switch { condition, cases }, line))
    }

    fn parse_switch_cases(&mut self, value_usage: TypeUsage) -> ParseResult<Vec<SwitchCase>> {
        let mut cases: Vec<SwitchCase> = Vec::new();
        while !self.cursor.eat("}") {
            if self.cursor.is_at_end() {
                return Err(self.cursor.expected("}"));
            }
            if self.cursor.eat("case") {
                let value = self.parse_expression()?;
                if self.const_eval(&value).is_none() {
                    return Err(self.error_at(
                        CompileErrorKind::NonIntegerValue {
                            context: "case".to_string(),
                        },
                        value.line,
                    ));
                }
                let value = self.coerce(value, value_usage)?;
                self.cursor.expect(":")?;
                cases.push(SwitchCase {
                    value: Some(value),
                    statements: Vec::new(),
                });
                continue;
            }
            if self.cursor.eat("default") {
                self.cursor.expect(":")?;
                cases.push(SwitchCase {
                    value: None,
                    statements: Vec::new(),
                });
                continue;
            }
            if cases.is_empty() {
                return Err(self.cursor.expected("case"));
            }
            let mut statements = Vec::new();
            self.parse_statement_into(&mut statements)?;
            if let Some(case) = cases.last_mut() {
                case.statements.extend(statements);
            }
        }
        Ok(cases)
    }

    fn parse_jump(&mut self, keyword: &str) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        let allowed = match keyword {
            "continue" => self.context.loops > 0,
            _ => self.context.breakables > 0,
        };
        if !allowed {
            return Err(self.error(misplaced(keyword)));
        }
        self.cursor.advance();
        self.cursor.expect(";")?;
        let kind = if keyword == "continue" {
            StmtKind::Continue
        } else {
            StmtKind::Break
        };
        Ok(Stmt::new(kind, line))
    }

    /// `return;` or `return expr;`, checked against the function's return
    /// type.
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        let Some(frame) = self.context.function.as_ref() else {
            return Err(self.error(misplaced("return")));
        };
        let (function, return_type) = (frame.name.clone(), frame.return_type);
        self.cursor.advance();

        if self.cursor.eat(";") {
            if !return_type.is_void() {
                return Err(self.error_at(CompileErrorKind::MissingReturnExpression { function }, line));
            }
            return Ok(Stmt::new(StmtKind::Return(None), line));
        }
        let value: Expr = self.parse_expression()?;
        self.cursor.expect(";")?;
        if return_type.is_void() {
            return Err(self.error_at(CompileErrorKind::VoidFunctionReturningValue { function }, line));
        }
        let value = self.coerce(value, return_type)?;
        Ok(Stmt::new(StmtKind::Return(Some(value)), line))
    }
}
