// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

/// Resolves names and checks types, filling the annotation tables codegen consumes.
use std::str::FromStr;

use tracing::debug;

use crate::annotations::Annotations;
use crate::ast::{
    Expr, ExprNode, Keyword, LineCol, LoopCondition, MethodDecl, NodeId, Param, ParamNode,
    Program, Stmt, StmtNode,
};
use crate::errors::{CompileContext, CompileError};
use crate::scope::{Scopes, Symbol};
use crate::types::{Access, DataType, TypeKeyword};

pub struct Checker {
    scopes: Scopes,
    annotations: Annotations,
    /// Return type of the method whose body is being checked.
    return_type: Option<DataType>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a type keyword to its type.
pub(crate) fn resolve_type_keyword(keyword: &Keyword) -> Result<DataType, CompileError> {
    TypeKeyword::from_str(&keyword.text)
        .map(TypeKeyword::data_type)
        .map_err(|_| {
            CompileError::UnknownTypeKeyword(
                CompileContext::new(keyword.line_col),
                keyword.text.clone(),
            )
        })
}

/// Map a method's access qualifier, which must be present.
pub(crate) fn resolve_access(method: &MethodDecl) -> Result<Access, CompileError> {
    let Some(keyword) = &method.access else {
        return Err(CompileError::MissingAccessQualifier(
            CompileContext::new(method.line_col),
            method.name.clone(),
        ));
    };
    Access::from_str(&keyword.text).map_err(|_| {
        CompileError::UnknownAccessQualifier(
            CompileContext::new(keyword.line_col),
            keyword.text.clone(),
        )
    })
}

/// Check a whole program, returning the filled annotation tables.
pub fn check(program: &Program) -> Result<Annotations, CompileError> {
    let mut checker = Checker::new();
    checker.check_program(program)?;
    Ok(checker.into_annotations())
}

impl Checker {
    pub fn new() -> Self {
        Self {
            scopes: Scopes::new(),
            annotations: Annotations::new(),
            return_type: None,
        }
    }

    pub fn into_annotations(self) -> Annotations {
        self.annotations
    }

    pub fn check_program(&mut self, program: &Program) -> Result<(), CompileError> {
        // Every signature goes in before any body is looked at, so calls may refer forward.
        for method in &program.methods {
            self.register_method(method)?;
        }
        debug!(methods = program.methods.len(), "registered method signatures");

        for method in &program.methods {
            self.check_method(method)?;
        }

        self.scopes.open_scope();
        for stmt in &program.statements {
            self.check_stmt(stmt)?;
        }
        self.scopes.close_scope();

        debug!(
            typed = self.annotations.typed_nodes(),
            bound = self.annotations.bound_nodes(),
            "checked program"
        );
        Ok(())
    }

    fn register_method(&mut self, method: &MethodDecl) -> Result<(), CompileError> {
        resolve_access(method)?;
        let return_type = resolve_type_keyword(&method.return_type)?;

        // Parameter types are worked out in a throwaway scope; the body pass declares them
        // again in the method's real scope.
        self.scopes.open_scope();
        let params = method
            .params
            .iter()
            .map(|p| self.check_param(p))
            .collect::<Result<Vec<_>, _>>();
        self.scopes.close_scope();
        let params = params?;

        let Some(symbol) = self
            .scopes
            .declare_method(&method.name, return_type, params)
        else {
            return Err(CompileError::DuplicateMethod(
                CompileContext::new(method.line_col),
                method.name.clone(),
            ));
        };
        self.annotations.set_type(method.id, return_type);
        self.annotations.set_symbol(method.id, symbol);
        Ok(())
    }

    fn check_method(&mut self, method: &MethodDecl) -> Result<(), CompileError> {
        let return_type = self.require_type(method.id, method.line_col)?;

        self.scopes.open_scope();
        for param in &method.params {
            self.check_param(param)?;
        }

        self.return_type = Some(return_type);
        let result = self.check_method_body(method, return_type);
        self.return_type = None;
        self.scopes.close_scope();
        result
    }

    fn check_method_body(
        &mut self,
        method: &MethodDecl,
        return_type: DataType,
    ) -> Result<(), CompileError> {
        for stmt in &method.body {
            self.check_stmt(stmt)?;
        }
        let ends_in_return = method
            .body
            .last()
            .is_some_and(|s| s.node.is_value_return());
        if return_type != DataType::Void && !ends_in_return {
            return Err(CompileError::MissingReturn(
                CompileContext::new(method.line_col),
                method.name.clone(),
            ));
        }
        Ok(())
    }

    fn check_param(&mut self, param: &Param) -> Result<DataType, CompileError> {
        match &param.node {
            ParamNode::Expr(expr) => {
                let data_type = self.check_expr(expr)?;
                if data_type == DataType::Void {
                    return Err(CompileError::VoidValue(CompileContext::new(expr.line_col)));
                }
                // Occupies its argument slots without binding a name.
                self.scopes.reserve_slots(data_type);
                Ok(self.annotations.set_type(param.id, data_type))
            }
            ParamNode::Declared { type_kw, name } => {
                let symbol = self.declare_variable(param.line_col, type_kw, name)?;
                self.annotations.set_symbol(param.id, symbol);
                let data_type = resolve_type_keyword(type_kw)?;
                Ok(self.annotations.set_type(param.id, data_type))
            }
        }
    }

    fn declare_variable(
        &mut self,
        line_col: LineCol,
        type_kw: &Keyword,
        name: &str,
    ) -> Result<Symbol, CompileError> {
        let data_type = resolve_type_keyword(type_kw)?;
        if data_type == DataType::Void {
            return Err(CompileError::VoidVariable(
                CompileContext::new(line_col),
                name.to_string(),
            ));
        }
        self.scopes
            .declare_variable(name, data_type)
            .ok_or_else(|| {
                CompileError::DuplicateVariable(CompileContext::new(line_col), name.to_string())
            })
    }

    fn check_block(&mut self, statements: &[Stmt]) -> Result<(), CompileError> {
        self.scopes.open_scope();
        let result = statements.iter().try_for_each(|s| self.check_stmt(s));
        self.scopes.close_scope();
        result
    }

    fn check_condition(&mut self, condition: &Expr) -> Result<(), CompileError> {
        let data_type = self.check_expr(condition)?;
        if data_type != DataType::Boolean {
            return Err(CompileError::NonBooleanCondition(
                CompileContext::new(condition.line_col),
                data_type,
            ));
        }
        Ok(())
    }

    pub fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let context = CompileContext::new(stmt.line_col);
        match &stmt.node {
            StmtNode::Declare {
                type_kw,
                name,
                init,
            } => {
                let declared = resolve_type_keyword(type_kw)?;
                if let Some(init) = init {
                    let found = self.check_expr(init)?;
                    if found != declared {
                        return Err(CompileError::TypeMismatch {
                            context,
                            expected: declared,
                            found,
                        });
                    }
                }
                let symbol = self.declare_variable(stmt.line_col, type_kw, name)?;
                self.annotations.set_symbol(stmt.id, symbol);
                self.annotations.set_type(stmt.id, declared);
            }
            StmtNode::Assign { name, value } => {
                let (symbol, declared) = self.resolve_variable(stmt.line_col, name)?;
                let found = self.check_expr(value)?;
                if found != declared {
                    return Err(CompileError::TypeMismatch {
                        context,
                        expected: declared,
                        found,
                    });
                }
                self.annotations.set_symbol(stmt.id, symbol);
                self.annotations.set_type(stmt.id, found);
            }
            StmtNode::Cond { arms, otherwise } => {
                for arm in arms {
                    self.check_condition(&arm.condition)?;
                    self.check_block(&arm.statements)?;
                }
                if let Some(otherwise) = otherwise {
                    self.check_block(&otherwise.statements)?;
                }
            }
            StmtNode::While { condition, body } => {
                self.check_condition(condition)?;
                self.check_block(body)?;
            }
            StmtNode::For {
                init,
                condition,
                step,
                body,
            } => {
                // One scope spans the header and the body.
                self.scopes.open_scope();
                let result = self.check_for(init, condition, step, body);
                self.scopes.close_scope();
                result?;
            }
            StmtNode::Print(expr) => {
                let data_type = self.check_expr(expr)?;
                if data_type == DataType::Void {
                    return Err(CompileError::VoidValue(CompileContext::new(expr.line_col)));
                }
                self.annotations.set_type(stmt.id, data_type);
            }
            StmtNode::Return(expr) => {
                let Some(expected) = self.return_type else {
                    return Err(CompileError::ReturnOutsideMethod(context));
                };
                let found = match expr {
                    Some(expr) => self.check_expr(expr)?,
                    None => DataType::Void,
                };
                if found != expected {
                    return Err(CompileError::TypeMismatch {
                        context,
                        expected,
                        found,
                    });
                }
                self.annotations.set_type(stmt.id, found);
            }
            StmtNode::Increment(name) | StmtNode::Decrement(name) => {
                let (symbol, data_type) = self.resolve_variable(stmt.line_col, name)?;
                if data_type != DataType::Int {
                    return Err(CompileError::NonIntegerStep(context, name.clone(), data_type));
                }
                self.annotations.set_symbol(stmt.id, symbol);
                self.annotations.set_type(stmt.id, data_type);
            }
            StmtNode::Call { name, args } => {
                self.check_call(stmt.id, stmt.line_col, name, args)?;
            }
        }
        Ok(())
    }

    fn check_for(
        &mut self,
        init: &Stmt,
        condition: &LoopCondition,
        step: &Stmt,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        self.check_stmt(init)?;
        self.check_loop_condition(condition)?;
        self.check_stmt(step)?;
        body.iter().try_for_each(|s| self.check_stmt(s))
    }

    fn check_loop_condition(&mut self, condition: &LoopCondition) -> Result<(), CompileError> {
        self.check_operands(condition.line_col, &condition.left, &condition.right)?;
        self.annotations.set_type(condition.id, DataType::Boolean);
        Ok(())
    }

    pub fn check_expr(&mut self, expr: &Expr) -> Result<DataType, CompileError> {
        let data_type = match &expr.node {
            ExprNode::Int(_) => DataType::Int,
            ExprNode::Double(_) => DataType::Double,
            ExprNode::Bool(_) => DataType::Boolean,
            ExprNode::Str(_) => DataType::String,
            ExprNode::Var(name) => {
                let (symbol, data_type) = self.resolve_variable(expr.line_col, name)?;
                self.annotations.set_symbol(expr.id, symbol);
                data_type
            }
            ExprNode::Binary(_, left, right) => self.check_operands(expr.line_col, left, right)?,
            ExprNode::Compare(_, left, right) => {
                self.check_operands(expr.line_col, left, right)?;
                DataType::Boolean
            }
            ExprNode::Paren(inner) => self.check_expr(inner)?,
            ExprNode::Call { name, args } => {
                return self.check_call(expr.id, expr.line_col, name, args);
            }
        };
        Ok(self.annotations.set_type(expr.id, data_type))
    }

    /// Both operands must have exactly the same non-VOID type, which is returned.
    fn check_operands(
        &mut self,
        line_col: LineCol,
        left: &Expr,
        right: &Expr,
    ) -> Result<DataType, CompileError> {
        let left_type = self.check_expr(left)?;
        let right_type = self.check_expr(right)?;
        for (operand, data_type) in [(left, left_type), (right, right_type)] {
            if data_type == DataType::Void {
                return Err(CompileError::VoidValue(CompileContext::new(operand.line_col)));
            }
        }
        let (left, right) = (left_type, right_type);
        if left != right {
            return Err(CompileError::TypeMismatch {
                context: CompileContext::new(line_col),
                expected: left,
                found: right,
            });
        }
        Ok(left)
    }

    fn check_call(
        &mut self,
        id: NodeId,
        line_col: LineCol,
        name: &str,
        args: &[Expr],
    ) -> Result<DataType, CompileError> {
        let context = CompileContext::new(line_col);
        let (symbol, return_type, params) = match self.scopes.lookup(name) {
            Some(
                symbol @ Symbol::Method {
                    return_type,
                    params,
                    ..
                },
            ) => (symbol.clone(), *return_type, params.clone()),
            Some(Symbol::Variable { .. }) => {
                return Err(CompileError::NotAMethod(context, name.to_string()));
            }
            None => return Err(CompileError::UnknownMethod(context, name.to_string())),
        };

        if args.len() != params.len() {
            return Err(CompileError::ArgumentCount {
                context,
                method: name.to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }
        for (arg, expected) in args.iter().zip(params) {
            let found = self.check_expr(arg)?;
            if found != expected {
                return Err(CompileError::TypeMismatch {
                    context: CompileContext::new(arg.line_col),
                    expected,
                    found,
                });
            }
        }

        self.annotations.set_symbol(id, symbol);
        Ok(self.annotations.set_type(id, return_type))
    }

    fn resolve_variable(
        &self,
        line_col: LineCol,
        name: &str,
    ) -> Result<(Symbol, DataType), CompileError> {
        match self.scopes.lookup(name) {
            Some(symbol @ Symbol::Variable { data_type, .. }) => Ok((symbol.clone(), *data_type)),
            Some(Symbol::Method { .. }) => Err(CompileError::NotAVariable(
                CompileContext::new(line_col),
                name.to_string(),
            )),
            None => Err(CompileError::UnknownVariable(
                CompileContext::new(line_col),
                name.to_string(),
            )),
        }
    }

    fn require_type(&self, id: NodeId, line_col: LineCol) -> Result<DataType, CompileError> {
        self.annotations
            .type_of(id)
            .ok_or(CompileError::MissingAnnotation(CompileContext::new(line_col), id))
    }
}
